// Source folder discovery and eligible clip listing.
use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub video_count: usize,
}

/// A descriptor resolved to the clips it currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFolder {
    pub descriptor: FolderDescriptor,
    pub files: Vec<PathBuf>,
}

fn read_dir_entries(path: &Path) -> Result<Vec<fs::DirEntry>> {
    let context = || format!("Failed to read folder {}", path.display());
    fs::read_dir(path)
        .map_err(|error| MixerError::filesystem(context(), error))?
        .map(|entry| entry.map_err(|error| MixerError::filesystem(context(), error)))
        .collect()
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| MixerError::filesystem("Failed to resolve working directory", error))
}

/// Immediate eligible files of `folder`, sorted by path. Subdirectories are not descended.
pub fn list_eligible_files(folder: &Path, filter: &MediaFilter) -> Result<Vec<PathBuf>> {
    let folder = absolute_path(folder)?;
    let mut files = Vec::new();
    for entry in read_dir_entries(&folder)? {
        let candidate = entry.path();
        if candidate.is_file() && filter.is_eligible(&candidate) {
            files.push(candidate);
        }
    }
    files.sort();
    Ok(files)
}

/// One descriptor per immediate subdirectory of `root`, sorted by name.
///
/// Any unreadable directory aborts the scan: callers need the complete folder list
/// to drive selection.
pub fn scan_source_root(root: &Path, filter: &MediaFilter) -> Result<Vec<FolderDescriptor>> {
    let root = absolute_path(root)?;
    let mut folders = Vec::new();
    for entry in read_dir_entries(&root)? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let video_count = list_eligible_files(&path, filter)?.len();
        let name = entry.file_name().to_string_lossy().to_string();
        debug!("source folder {name}: {video_count} eligible clip(s)");
        folders.push(FolderDescriptor {
            name,
            path,
            video_count,
        });
    }
    folders.sort_by(|left, right| left.name.cmp(&right.name));
    info!(
        "scanned {} source folder(s) under {}",
        folders.len(),
        root.display()
    );
    Ok(folders)
}

/// Lists every descriptor's clips concurrently and joins before returning.
/// At most `available_parallelism` folders are read at once. Result order matches
/// `descriptors`.
pub fn resolve_source_folders(
    descriptors: &[FolderDescriptor],
    filter: &MediaFilter,
) -> Result<Vec<SourceFolder>> {
    let workers = thread::available_parallelism().map_or(1, |count| count.get());
    resolve_in_batches(descriptors, filter, workers)
}

pub(super) fn resolve_in_batches(
    descriptors: &[FolderDescriptor],
    filter: &MediaFilter,
    workers: usize,
) -> Result<Vec<SourceFolder>> {
    let mut folders = Vec::with_capacity(descriptors.len());
    for batch in descriptors.chunks(workers.max(1)) {
        let resolved: Result<Vec<SourceFolder>> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|descriptor| scope.spawn(move || resolve_one(descriptor, filter)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });
        folders.extend(resolved?);
    }
    Ok(folders)
}

fn resolve_one(descriptor: &FolderDescriptor, filter: &MediaFilter) -> Result<SourceFolder> {
    let files = list_eligible_files(&descriptor.path, filter)?;
    Ok(SourceFolder {
        descriptor: FolderDescriptor {
            video_count: files.len(),
            ..descriptor.clone()
        },
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"clip").unwrap();
    }

    #[test]
    fn scan_counts_eligible_files_per_subfolder() {
        let root = tempfile::tempdir().unwrap();
        let beach = root.path().join("beach");
        let city = root.path().join("city");
        fs::create_dir(&beach).unwrap();
        fs::create_dir(&city).unwrap();
        touch(&beach.join("wave.mp4"));
        touch(&beach.join("sunset.MOV"));
        touch(&beach.join("notes.txt"));
        touch(&city.join("readme.md"));
        touch(&root.path().join("loose.mp4"));

        let folders = scan_source_root(root.path(), &MediaFilter::default()).unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].name, "beach");
        assert_eq!(folders[0].video_count, 2);
        assert_eq!(folders[0].path, beach);
        assert_eq!(folders[1].name, "city");
        assert_eq!(folders[1].video_count, 0);
    }

    #[test]
    fn scan_is_not_recursive() {
        let root = tempfile::tempdir().unwrap();
        let outer = root.path().join("outer");
        let inner = outer.join("inner");
        fs::create_dir_all(&inner).unwrap();
        touch(&inner.join("deep.mp4"));
        touch(&outer.join("top.mkv"));

        let folders = scan_source_root(root.path(), &MediaFilter::default()).unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].video_count, 1);
    }

    #[test]
    fn missing_root_is_a_filesystem_error() {
        let root = tempfile::tempdir().unwrap();
        let error =
            scan_source_root(&root.path().join("absent"), &MediaFilter::default()).unwrap_err();
        assert!(matches!(error, MixerError::Filesystem { .. }));
    }

    #[test]
    fn list_returns_sorted_absolute_paths() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("b.mp4"));
        touch(&root.path().join("a.avi"));
        fs::create_dir(root.path().join("nested.mp4")).unwrap();

        let files = list_eligible_files(root.path(), &MediaFilter::default()).unwrap();
        assert_eq!(
            files,
            vec![root.path().join("a.avi"), root.path().join("b.mp4")]
        );
        assert!(files.iter().all(|path| path.is_absolute()));
    }

    #[test]
    fn resolve_keeps_input_order_and_refreshes_counts() {
        let root = tempfile::tempdir().unwrap();
        let mut descriptors = Vec::new();
        for (name, clips) in [("z", 2), ("a", 0), ("m", 1)] {
            let path = root.path().join(name);
            fs::create_dir(&path).unwrap();
            for index in 0..clips {
                touch(&path.join(format!("{index}.mp4")));
            }
            descriptors.push(FolderDescriptor {
                name: name.to_string(),
                path,
                video_count: 99,
            });
        }

        let resolved = resolve_source_folders(&descriptors, &MediaFilter::default()).unwrap();
        let names: Vec<_> = resolved
            .iter()
            .map(|folder| folder.descriptor.name.as_str())
            .collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        let counts: Vec<_> = resolved
            .iter()
            .map(|folder| folder.descriptor.video_count)
            .collect();
        assert_eq!(counts, vec![2, 0, 1]);
    }

    #[test]
    fn resolve_fails_when_any_folder_is_unreadable() {
        let root = tempfile::tempdir().unwrap();
        let good = root.path().join("good");
        fs::create_dir(&good).unwrap();
        touch(&good.join("clip.mp4"));
        let descriptors = vec![
            FolderDescriptor {
                name: "good".to_string(),
                path: good,
                video_count: 1,
            },
            FolderDescriptor {
                name: "gone".to_string(),
                path: root.path().join("gone"),
                video_count: 3,
            },
        ];
        assert!(matches!(
            resolve_source_folders(&descriptors, &MediaFilter::default()),
            Err(MixerError::Filesystem { .. })
        ));
    }

    #[test]
    fn batched_resolution_covers_folders_beyond_the_worker_count() {
        let root = tempfile::tempdir().unwrap();
        let mut descriptors = Vec::new();
        for index in 0..7 {
            let name = format!("folder-{index}");
            let path = root.path().join(&name);
            fs::create_dir(&path).unwrap();
            for clip in 0..index % 3 {
                touch(&path.join(format!("{clip}.mkv")));
            }
            descriptors.push(FolderDescriptor {
                name,
                path,
                video_count: 0,
            });
        }

        for workers in [0, 1, 2, 7, 16] {
            let resolved =
                resolve_in_batches(&descriptors, &MediaFilter::default(), workers).unwrap();
            let names: Vec<_> = resolved
                .iter()
                .map(|folder| folder.descriptor.name.clone())
                .collect();
            let expected: Vec<_> = descriptors.iter().map(|folder| folder.name.clone()).collect();
            assert_eq!(names, expected, "workers = {workers}");
            let counts: Vec<_> = resolved
                .iter()
                .map(|folder| folder.descriptor.video_count)
                .collect();
            assert_eq!(counts, vec![0, 1, 2, 0, 1, 2, 0], "workers = {workers}");
        }
    }
}
