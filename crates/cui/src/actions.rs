use crate::app::App;
use crate::input::InputAction;

pub fn dispatch(app: &mut App, action: InputAction) {
    if app.reveal_open() {
        dispatch_reveal(app, action);
        return;
    }
    match action {
        InputAction::None | InputAction::PickAgain | InputAction::CloseReveal => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::Back => app.show_help = false,
        InputAction::SwitchFocus => app.switch_focus(),
        InputAction::MoveUp => app.move_cursor(false),
        InputAction::MoveDown => app.move_cursor(true),
        InputAction::ToggleSelect => app.toggle_focused(),
        InputAction::ClearSelection => app.clear_selection(),
        InputAction::Activate => app.activate_primary(),
        InputAction::FocusSearch => app.begin_search(),
        InputAction::ClearSearch => app.clear_search(),
        InputAction::Pick => app.request_pick(),
        InputAction::LoadMore => app.load_more(),
        InputAction::Retry => app.retry(),
    }
}

/// The reveal overlay is modal: only its own actions, help and quit get through.
fn dispatch_reveal(app: &mut App, action: InputAction) {
    match action {
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::PickAgain | InputAction::Pick => app.pick_again(),
        InputAction::Back | InputAction::CloseReveal => {
            if app.show_help {
                app.show_help = false;
            } else {
                app.close_reveal();
            }
        }
        InputAction::Activate => app.activate_primary(),
        _ => {}
    }
}
