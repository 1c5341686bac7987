use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

/// Loads image bytes off-thread. The receiver gets `None` for unreadable or
/// undecodable files; a receiver dropped before the load finishes simply
/// discards the result.
pub fn fetch(path: PathBuf) -> mpsc::Receiver<Option<Vec<u8>>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let _ = sender.send(read_image(&path));
    });
    receiver
}

fn read_image(path: &Path) -> Option<Vec<u8>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            log::warn!("couldn't read image {}: {error}", path.display());
            return None;
        }
    };
    if let Err(error) = image::load_from_memory(&bytes) {
        log::warn!("couldn't decode image {}: {error}", path.display());
        return None;
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn temp_file(file_name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(file_name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn fetch_delivers_bytes_for_a_real_image() {
        let mut encoded = Vec::new();
        image::RgbImage::new(2, 2)
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();
        let path = temp_file("recipe_box_photo_ok.png", &encoded);

        let loaded = fetch(path).recv().unwrap();
        assert_eq!(loaded, Some(encoded));
    }

    #[test]
    fn garbage_bytes_degrade_to_none() {
        let path = temp_file("recipe_box_photo_bad.png", b"not an image");
        assert_eq!(fetch(path).recv().unwrap(), None);
    }

    #[test]
    fn missing_file_degrades_to_none() {
        let path = std::env::temp_dir().join("recipe_box_photo_missing.png");
        let _ = fs::remove_file(&path);
        assert_eq!(fetch(path).recv().unwrap(), None);
    }
}
