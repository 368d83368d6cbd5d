use super::credits::reset_hint;
use super::friendly;
use anyhow::{Context, Result};
use headshot_application::{AppContext, StudioUseCase};
use headshot_core::generation::HeadshotStyle;
use headshot_core::image::{ImageRef, UploadPolicy};
use headshot_core::Identity;
use std::path::{Path, PathBuf};

pub struct GenerateRequest {
    pub input: PathBuf,
    pub style: HeadshotStyle,
    pub prompt: Option<String>,
    pub edits: Vec<String>,
    pub undo: usize,
    pub output: PathBuf,
}

pub async fn run(ctx: &AppContext, identity: Identity, request: GenerateRequest) -> Result<()> {
    let studio = ctx.studio().map_err(friendly)?;
    let selfie = load_selfie(&request.input)?;

    let session_id = studio.open_session(identity.clone()).await;
    let outcome = drive_session(studio, &session_id, selfie, &request).await;
    if let Err(e) = studio.close_session(&session_id).await {
        tracing::debug!("Session already closed: {}", e);
    }
    let image = outcome?;

    let path = output_path(&request.output, &image);
    save_image(&path, &image)?;
    println!("Saved {}", path.display());
    println!(
        "{} generation(s) left today{}",
        studio.usage().remaining(&identity),
        reset_hint(studio.usage(), &identity)
    );
    Ok(())
}

async fn drive_session(
    studio: &StudioUseCase,
    session_id: &str,
    selfie: ImageRef,
    request: &GenerateRequest,
) -> Result<ImageRef> {
    println!("Generating a {} headshot...", request.style);
    studio
        .generate_headshot(session_id, selfie, request.style, request.prompt.as_deref())
        .await
        .map_err(friendly)?;

    for edit in &request.edits {
        println!("Applying edit: {edit}");
        if let Err(e) = studio.apply_edit(session_id, edit).await {
            // Keep what was produced so far.
            eprintln!("Edit failed: {}", e.user_message());
            break;
        }
    }

    let mut snapshot = studio.snapshot(session_id).await.map_err(friendly)?;
    for _ in 0..request.undo {
        if !snapshot.can_undo {
            eprintln!("Nothing left to undo");
            break;
        }
        snapshot = studio.undo(session_id).await.map_err(friendly)?;
    }

    if let Some(cursor) = snapshot.cursor {
        println!("Using frame {} of {}", cursor + 1, snapshot.frame_count);
    }
    snapshot.current.context("No image was produced")
}

fn load_selfie(path: &Path) -> Result<ImageRef> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    UploadPolicy::default()
        .validate(&file_name, &bytes)
        .map_err(friendly)
}

/// Adds the image's extension when the requested path has none.
fn output_path(requested: &Path, image: &ImageRef) -> PathBuf {
    if requested.extension().is_some() {
        requested.to_path_buf()
    } else {
        requested.with_extension(image.extension())
    }
}

fn save_image(path: &Path, image: &ImageRef) -> Result<()> {
    let bytes = image.decode().map_err(friendly)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_output_path_gets_extension() {
        let jpeg = ImageRef::new("image/jpeg", "");
        assert_eq!(output_path(Path::new("out/me"), &jpeg), PathBuf::from("out/me.jpg"));
        assert_eq!(output_path(Path::new("me.png"), &jpeg), PathBuf::from("me.png"));
    }

    #[test]
    fn test_selfie_round_trip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("selfie.png");
        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(b"pixels");
        std::fs::write(&input, &bytes).unwrap();

        let image = load_selfie(&input).unwrap();
        let output = temp_dir.path().join("nested").join("headshot.png");
        save_image(&output, &image).unwrap();
        assert_eq!(std::fs::read(output).unwrap(), bytes);
    }

    #[test]
    fn test_non_image_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("notes.txt");
        std::fs::write(&input, "hello").unwrap();
        assert!(load_selfie(&input).is_err());
    }
}
