use serde::{Deserialize, Serialize};

use crate::models::{Post, PostStatus, RemotePost};

/// What to do with one fetched post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Not known locally; store it as published
    Insert,
    /// Local copy is published and the server moved on; take the server content
    Overwrite,
    /// Server matches what was last synced; nothing to do
    Unchanged,
    /// Local edits are pending and the server has not moved; mark published
    ConfirmLocalEdit,
    /// Local edits are pending and the server moved too; keep the local edit
    KeepLocalEdit,
}

/// Decide how `remote` merges into its local counterpart.
///
/// Posts that exist only locally are never touched by a merge, so a missing
/// server post does not delete anything.
pub fn decide(local: Option<&Post>, remote: &RemotePost) -> MergeDecision {
    let Some(local) = local else {
        return MergeDecision::Insert;
    };

    let matches_synced = local.synced.as_ref() == Some(&remote.content);
    match local.status {
        PostStatus::Edited if matches_synced || local.content == remote.content => {
            MergeDecision::ConfirmLocalEdit
        }
        PostStatus::Edited => MergeDecision::KeepLocalEdit,
        // a local post carries no remote id, so only a stray match ends up here
        PostStatus::Local | PostStatus::Published if matches_synced => MergeDecision::Unchanged,
        PostStatus::Local | PostStatus::Published => MergeDecision::Overwrite,
    }
}

/// Counts of what a merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub inserted: usize,
    pub overwritten: usize,
    pub confirmed: usize,
    pub conflicts: usize,
    pub unchanged: usize,
}

impl MergeReport {
    pub fn record(&mut self, decision: MergeDecision) {
        match decision {
            MergeDecision::Insert => self.inserted += 1,
            MergeDecision::Overwrite => self.overwritten += 1,
            MergeDecision::Unchanged => self.unchanged += 1,
            MergeDecision::ConfirmLocalEdit => self.confirmed += 1,
            MergeDecision::KeepLocalEdit => self.conflicts += 1,
        }
    }

    /// Whether the merge changed any local state.
    pub const fn changed_anything(&self) -> bool {
        self.inserted + self.overwritten + self.confirmed > 0
    }

    pub const fn total(&self) -> usize {
        self.inserted + self.overwritten + self.confirmed + self.conflicts + self.unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostContent, PostFont, PostLocale};
    use pretty_assertions::assert_eq;

    fn remote(title: &str, body: &str) -> RemotePost {
        RemotePost {
            remote_id: "abc".to_string(),
            slug: None,
            content: PostContent::new(title, body),
            collection_alias: None,
            created_at: 1,
            updated_at: Some(2),
            font: PostFont::Serif,
            locale: PostLocale::default(),
        }
    }

    fn synced_post(status: PostStatus, synced: PostContent, content: PostContent) -> Post {
        let mut post = Post::new(None, PostFont::Serif, PostLocale::default());
        post.remote_id = Some("abc".to_string());
        post.status = status;
        post.synced = Some(synced);
        post.content = content;
        post
    }

    #[test]
    fn unknown_post_is_inserted() {
        assert_eq!(decide(None, &remote("T", "B")), MergeDecision::Insert);
    }

    #[test]
    fn published_post_follows_server() {
        let base = PostContent::new("T", "B");
        let post = synced_post(PostStatus::Published, base.clone(), base);

        assert_eq!(decide(Some(&post), &remote("T", "B")), MergeDecision::Unchanged);
        assert_eq!(decide(Some(&post), &remote("T", "B2")), MergeDecision::Overwrite);
    }

    #[test]
    fn edited_post_is_confirmed_when_server_has_not_moved() {
        let post = synced_post(
            PostStatus::Edited,
            PostContent::new("T", "B"),
            PostContent::new("T", "local edit"),
        );
        assert_eq!(
            decide(Some(&post), &remote("T", "B")),
            MergeDecision::ConfirmLocalEdit
        );
        assert_eq!(
            decide(Some(&post), &remote("T", "local edit")),
            MergeDecision::ConfirmLocalEdit
        );
    }

    #[test]
    fn edited_post_wins_over_third_party_change() {
        let post = synced_post(
            PostStatus::Edited,
            PostContent::new("T", "B"),
            PostContent::new("T", "local edit"),
        );
        assert_eq!(
            decide(Some(&post), &remote("T", "changed elsewhere")),
            MergeDecision::KeepLocalEdit
        );
    }

    #[test]
    fn report_counts_decisions() {
        let mut report = MergeReport::default();
        for decision in [
            MergeDecision::Insert,
            MergeDecision::Insert,
            MergeDecision::Unchanged,
            MergeDecision::KeepLocalEdit,
        ] {
            report.record(decision);
        }

        assert_eq!(
            report,
            MergeReport {
                inserted: 2,
                overwritten: 0,
                confirmed: 0,
                conflicts: 1,
                unchanged: 1,
            }
        );
        assert_eq!(report.total(), 4);
        assert!(report.changed_anything());
        assert!(!MergeReport::default().changed_anything());
    }
}
