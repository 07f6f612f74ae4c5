#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let mut config = portfolio_scene::SceneConfig::default();
    if let Some(path) = std::env::args().nth(1) {
        config.asset_path = path;
    }
    config.debug = std::env::var_os("PORTFOLIO_DEBUG").is_some();
    portfolio_scene::flow::run(config)
}

// The browser build is driven by `PortfolioScene` from JavaScript.
#[cfg(target_arch = "wasm32")]
fn main() {}
