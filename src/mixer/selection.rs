// Random clip draw and shuffle.
use super::*;
use rand::seq::SliceRandom;
use rand::Rng;

/// Ordered clips to concatenate; at most one per source folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    clips: Vec<PathBuf>,
}

impl Selection {
    pub fn from_clips(clips: Vec<PathBuf>) -> Self {
        Self { clips }
    }

    pub fn clips(&self) -> &[PathBuf] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn into_clips(self) -> Vec<PathBuf> {
        self.clips
    }
}

/// Draws one clip uniformly from every folder that has any, then shuffles the draws.
///
/// Folders without clips are skipped. `SliceRandom::shuffle` is a Fisher–Yates pass,
/// so every ordering of the drawn clips is equally likely regardless of folder order.
pub fn select_clips<R>(folders: &[SourceFolder], rng: &mut R) -> Result<Selection>
where
    R: Rng + ?Sized,
{
    let mut clips = Vec::with_capacity(folders.len());
    for folder in folders {
        match folder.files.choose(&mut *rng) {
            Some(clip) => clips.push(clip.clone()),
            None => debug!("skipping {}: no eligible clips", folder.descriptor.name),
        }
    }
    if clips.is_empty() {
        return Err(MixerError::NoEligibleMedia);
    }
    clips.shuffle(&mut *rng);
    Ok(Selection { clips })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn folder(name: &str, files: &[&str]) -> SourceFolder {
        let path = PathBuf::from("/sources").join(name);
        SourceFolder {
            descriptor: FolderDescriptor {
                name: name.to_string(),
                path: path.clone(),
                video_count: files.len(),
            },
            files: files.iter().map(|file| path.join(file)).collect(),
        }
    }

    #[test]
    fn each_folder_contributes_from_its_own_files() {
        let folders = vec![
            folder("a", &["a1.mp4", "a2.mp4", "a3.mp4"]),
            folder("b", &["b1.mov"]),
            folder("c", &["c1.mkv", "c2.mkv"]),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let selection = select_clips(&folders, &mut rng).unwrap();
            assert_eq!(selection.len(), 3);
            for source in &folders {
                let hits = selection
                    .clips()
                    .iter()
                    .filter(|clip| source.files.contains(clip))
                    .count();
                assert_eq!(hits, 1, "folder {} drawn {hits} times", source.descriptor.name);
            }
        }
    }

    #[test]
    fn empty_folders_are_skipped() {
        let folders = vec![
            folder("a", &["a1.mp4"]),
            folder("empty", &[]),
            folder("c", &["c1.mp4"]),
        ];
        let selection = select_clips(&folders, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(selection.len(), 2);
        assert!(selection
            .clips()
            .iter()
            .all(|clip| !clip.starts_with("/sources/empty")));
    }

    #[test]
    fn no_clips_anywhere_is_an_error() {
        let folders = vec![folder("a", &[]), folder("b", &[])];
        assert!(matches!(
            select_clips(&folders, &mut StdRng::seed_from_u64(1)),
            Err(MixerError::NoEligibleMedia)
        ));
        assert!(matches!(
            select_clips(&[], &mut StdRng::seed_from_u64(1)),
            Err(MixerError::NoEligibleMedia)
        ));
    }

    #[test]
    fn draws_are_uniform_within_a_folder() {
        let folders = vec![folder("a", &["1.mp4", "2.mp4", "3.mp4", "4.mp4"])];
        let mut rng = StdRng::seed_from_u64(99);
        let trials = 8_000;
        let mut counts: HashMap<PathBuf, usize> = HashMap::new();
        for _ in 0..trials {
            let selection = select_clips(&folders, &mut rng).unwrap();
            *counts.entry(selection.clips()[0].clone()).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        for (clip, count) in counts {
            let share = count as f64 / trials as f64;
            assert!((share - 0.25).abs() < 0.03, "{} drawn {share}", clip.display());
        }
    }

    #[test]
    fn order_is_a_uniform_permutation() {
        let folders = vec![
            folder("a", &["a.mp4"]),
            folder("b", &["b.mp4"]),
            folder("c", &["c.mp4"]),
        ];
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 12_000;
        let mut counts: HashMap<Vec<PathBuf>, usize> = HashMap::new();
        for _ in 0..trials {
            let selection = select_clips(&folders, &mut rng).unwrap();
            *counts.entry(selection.into_clips()).or_default() += 1;
        }
        assert_eq!(counts.len(), 6, "every ordering of 3 clips should appear");
        let expected = 1.0 / 6.0;
        for (order, count) in counts {
            let share = count as f64 / trials as f64;
            assert!(
                (share - expected).abs() < 0.02,
                "ordering {order:?} observed with share {share}"
            );
        }
    }
}
