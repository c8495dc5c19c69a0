mod app;
mod logging;
mod persistence;
mod runner;

fn main() -> anyhow::Result<()> {
    app::run()
}
