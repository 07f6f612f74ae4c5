use anyhow::Context;
use image::RgbaImage;

/// Directory relative paths resolve against in the native preview.
#[cfg(not(target_arch = "wasm32"))]
pub const ASSET_ROOT: &str = "./assets";

pub fn is_remote(file_name: &str) -> bool {
    file_name.starts_with("http://") || file_name.starts_with("https://")
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name)?)
}

async fn fetch(url: reqwest::Url) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url.clone())
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Loads a file by path or URL.
///
/// `http(s)` URLs are fetched on every platform. Other paths resolve against the
/// page origin in the browser and against [`ASSET_ROOT`] natively, so
/// `/portfolio/scene.glb` is served from the same place on both.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    if is_remote(file_name) {
        let url = reqwest::Url::parse(file_name)?;
        return fetch(url).await;
    }

    #[cfg(target_arch = "wasm32")]
    let data = fetch(format_url(file_name)?).await?;

    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(ASSET_ROOT).join(file_name.trim_start_matches('/'));
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Decodes a raster image (PNG, JPEG, ...) into RGBA.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://cdn.jsdelivr.net/gh/devicons/x.svg"));
        assert!(!is_remote("/portfolio/koguchi_asset_portfolio.glb"));
    }

    #[test]
    fn decodes_png_bytes() {
        let mut bytes = Vec::new();
        let img = RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (2, 3));
        assert_eq!(decoded.get_pixel(1, 2), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
