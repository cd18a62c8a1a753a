use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Quit,
    ToggleHelp,
    Back,
    SwitchFocus,
    MoveUp,
    MoveDown,
    ToggleSelect,
    ClearSelection,
    Activate,
    FocusSearch,
    ClearSearch,
    Pick,
    PickAgain,
    CloseReveal,
    LoadMore,
    Retry,
}

pub fn map_key(key: KeyEvent) -> InputAction {
    match key.code {
        KeyCode::Esc => InputAction::Back,
        KeyCode::Tab | KeyCode::BackTab => InputAction::SwitchFocus,
        KeyCode::Up => InputAction::MoveUp,
        KeyCode::Down => InputAction::MoveDown,
        KeyCode::Enter => InputAction::Activate,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => InputAction::Quit,
        KeyCode::Char('q') => InputAction::Quit,
        KeyCode::Char('?') => InputAction::ToggleHelp,
        KeyCode::Char(' ') => InputAction::ToggleSelect,
        KeyCode::Char('k') => InputAction::MoveUp,
        KeyCode::Char('j') => InputAction::MoveDown,
        KeyCode::Char('/') => InputAction::FocusSearch,
        KeyCode::Char('x') => InputAction::ClearSearch,
        KeyCode::Char('c') => InputAction::ClearSelection,
        KeyCode::Char('r') => InputAction::Pick,
        KeyCode::Char('a') => InputAction::PickAgain,
        KeyCode::Char('w') => InputAction::CloseReveal,
        KeyCode::Char('m') => InputAction::LoadMore,
        KeyCode::Char('R') => InputAction::Retry,
        _ => InputAction::None,
    }
}
