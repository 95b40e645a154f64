use glimmer::app;
use glimmer::io::config::Config;
use log::error;

const CONFIG_PATH: &str = "glimmer.toml";

fn main() {
    env_logger::init();

    let config = Config::load_or_default(CONFIG_PATH);
    if let Err(e) = app::run(config) {
        error!("{e}");
        std::process::exit(1);
    }
}
