//! Avatar asset model and the loader seam

use std::path::PathBuf;

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

/// A named animation clip from a loaded asset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Clip length in seconds
    pub duration: f32,
}

/// Result of a successful asset load. The scene graph is opaque to this
/// crate and only carried through to the renderer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadedAsset {
    pub scene: String,
    #[serde(default)]
    pub clips: Vec<AnimationClip>,
}

/// Asset load errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse asset manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Asset manifest has no scene")]
    MissingScene,
}

/// Loads the avatar asset. Each call is an independent load.
pub trait AssetLoader: Send + Sync + 'static {
    fn load(&self) -> BoxFuture<'static, Result<LoadedAsset, AssetError>>;
}

/// Loads the avatar from a JSON manifest on disk
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    path: PathBuf,
}

impl ManifestLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AssetLoader for ManifestLoader {
    fn load(&self) -> BoxFuture<'static, Result<LoadedAsset, AssetError>> {
        let path = self.path.clone();
        Box::pin(async move {
            let raw = tokio::fs::read(&path)
                .await
                .map_err(|source| AssetError::Io {
                    path: path.clone(),
                    source,
                })?;

            let asset: LoadedAsset = serde_json::from_slice(&raw)?;
            if asset.scene.is_empty() {
                return Err(AssetError::MissingScene);
            }

            debug!(
                path = %path.display(),
                clips = asset.clips.len(),
                "Loaded avatar manifest"
            );
            Ok(asset)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "avatar-sync-{}-{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_partial_clip_set() {
        let path = write_manifest(
            "partial",
            r#"{"scene":"Xbot.glb","clips":[{"name":"idle","duration":2.0}]}"#,
        );
        let asset = ManifestLoader::new(&path).load().await.unwrap();
        assert_eq!(asset.scene, "Xbot.glb");
        assert_eq!(asset.clips.len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let loader = ManifestLoader::new("/nonexistent/avatar.json");
        let result = tokio_test::block_on(loader.load());
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }

    #[tokio::test]
    async fn empty_scene_is_rejected() {
        let path = write_manifest("empty", r#"{"scene":""}"#);
        let result = ManifestLoader::new(&path).load().await;
        assert!(matches!(result, Err(AssetError::MissingScene)));
        let _ = std::fs::remove_file(path);
    }
}
