fn main() -> anyhow::Result<()> {
    heropick_cui::run(heropick_cui::LaunchOptions::from_env())
}
