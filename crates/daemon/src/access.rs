//! Decides which unlockable files a user may open.

use std::collections::HashSet;

use common::prelude::{AccessibleFile, File};

/// Answers whether a user holds a minted token of one of the given offers.
#[async_trait::async_trait]
pub trait UnlockOwnership {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn user_owns_token_unlocking(
        &self,
        user: &str,
        offer_ids: &[String],
    ) -> Result<bool, Self::Error>;
}

/// A file together with every offer whose tokens unlock it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub file: File,
    pub offers: Vec<String>,
}

/// Annotate each candidate with `isUnlocked` for `user`.
///
/// Anonymous requests never unlock anything. With `dedup` set only the
/// first candidate of each file id is kept.
pub async fn filter_file_access<O>(
    ownership: &O,
    candidates: Vec<FileCandidate>,
    user: Option<&str>,
    dedup: bool,
) -> Result<Vec<AccessibleFile>, O::Error>
where
    O: UnlockOwnership + Sync,
{
    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if dedup && !seen.insert(candidate.file.id.clone()) {
            continue;
        }

        let is_unlocked = match user {
            Some(user) if !user.is_empty() => {
                ownership
                    .user_owns_token_unlocking(user, &candidate.offers)
                    .await?
            }
            _ => false,
        };

        files.push(AccessibleFile {
            file: candidate.file,
            is_unlocked,
        });
    }

    Ok(files)
}
