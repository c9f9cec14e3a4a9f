use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use parking_lot::Mutex;

use super::metadata::write_metadata;
use crate::models::error::StorageError;
use crate::models::photo::PhotoMetadata;
use crate::traits::photo_storage::{PhotoStorage, StoreCompletion};

const FILE_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

struct StoreJob {
    data: Vec<u8>,
    on_stored: StoreCompletion,
}

/// [`PhotoStorage`] writing JPEG files into one directory.
///
/// Files are named after the local capture time; a JSON sidecar with size
/// and checksum is written next to each. Writes happen on a dedicated
/// thread, and the completion reports the file path as locator.
pub struct DirectoryPhotoStore {
    directory: PathBuf,
    jobs: Mutex<Option<Sender<StoreJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DirectoryPhotoStore {
    pub fn new(directory: impl Into<PathBuf>) -> io::Result<Self> {
        let directory = directory.into();
        let (jobs, queue) = mpsc::channel();
        let target = directory.clone();
        let worker = thread::Builder::new()
            .name("photo-store".into())
            .spawn(move || run(&target, queue))?;
        Ok(Self {
            directory,
            jobs: Mutex::new(Some(jobs)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Finish queued writes and stop the writer thread.
    pub fn shutdown(&self) {
        self.jobs.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                log::error!("photo store thread panicked");
            }
        }
    }
}

impl PhotoStorage for DirectoryPhotoStore {
    fn store_photo(&self, data: Vec<u8>, on_stored: StoreCompletion) {
        let job = StoreJob { data, on_stored };
        let rejected = match &*self.jobs.lock() {
            Some(jobs) => jobs.send(job).err().map(|e| e.0),
            None => Some(job),
        };
        if let Some(job) = rejected {
            warn!("photo store shut down, dropping {} bytes", job.data.len());
            (job.on_stored)(false, None);
        }
    }
}

impl Drop for DirectoryPhotoStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(directory: &Path, queue: Receiver<StoreJob>) {
    for job in queue {
        match store(directory, &job.data) {
            Ok(path) => {
                let locator = path.to_string_lossy().into_owned();
                debug!("stored photo {}", locator);
                (job.on_stored)(true, Some(locator));
            }
            Err(e) => {
                log::error!("failed to store photo: {}", e);
                (job.on_stored)(false, None);
            }
        }
    }
}

fn store(directory: &Path, data: &[u8]) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(directory)
        .map_err(|e| StorageError::Io(format!("failed to create directory: {}", e)))?;
    let path = unique_path(directory, &chrono::Local::now().format(FILE_NAME_FORMAT).to_string());
    fs::write(&path, data)
        .map_err(|e| StorageError::Io(format!("failed to write photo: {}", e)))?;
    write_metadata(&PhotoMetadata::new(&path, data), &path)?;
    Ok(path)
}

/// `{stem}.jpg`, or `{stem}_{n}.jpg` when taken within the same millisecond.
fn unique_path(directory: &Path, stem: &str) -> PathBuf {
    let mut path = directory.join(format!("{}.jpg", stem));
    let mut n = 1;
    while path.exists() {
        path = directory.join(format!("{}_{}.jpg", stem, n));
        n += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::photo::sha256_hex;
    use crate::storage::metadata::read_metadata;
    use std::time::Duration;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("camera-store-{}", uuid::Uuid::new_v4()))
    }

    fn store_and_wait(store: &DirectoryPhotoStore, data: Vec<u8>) -> (bool, Option<String>) {
        let (tx, rx) = mpsc::channel();
        store.store_photo(
            data,
            Box::new(move |success, locator| tx.send((success, locator)).unwrap()),
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn stores_photo_with_sidecar() {
        let dir = temp_dir();
        let store = DirectoryPhotoStore::new(&dir).unwrap();
        let (success, locator) = store_and_wait(&store, b"jpeg".to_vec());
        assert!(success);

        let path = PathBuf::from(locator.unwrap());
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"jpeg");

        let metadata = read_metadata(&path).unwrap();
        assert_eq!(metadata.size_bytes, 4);
        assert_eq!(metadata.checksum, sha256_hex(b"jpeg"));

        drop(store);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn photos_in_the_same_millisecond_get_distinct_names() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("shot.jpg"), b"a").unwrap();
        fs::write(dir.join("shot_1.jpg"), b"b").unwrap();
        assert_eq!(unique_path(&dir, "shot"), dir.join("shot_2.jpg"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn store_after_shutdown_fails() {
        let dir = temp_dir();
        let store = DirectoryPhotoStore::new(&dir).unwrap();
        store.shutdown();
        assert_eq!(store_and_wait(&store, vec![1]), (false, None));
    }

    #[test]
    fn unwritable_directory_reports_failure() {
        let file = temp_dir();
        fs::write(&file, b"not a directory").unwrap();
        let store = DirectoryPhotoStore::new(file.join("photos")).unwrap();
        assert_eq!(store_and_wait(&store, vec![1]), (false, None));
        drop(store);
        fs::remove_file(&file).unwrap();
    }
}
