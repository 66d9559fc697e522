//! Per-submission working state.
//!
//! A [`SubmissionContext`] is created when a submission starts and removes its
//! transient files when dropped, so every exit path of the pipeline cleans up
//! without explicit calls.

use std::path::{Path, PathBuf};

use nanopub_submitter::UriRewrite;
use uuid::Uuid;

/// Working state of one submission.
#[derive(Debug)]
pub struct SubmissionContext {
    id: String,
    workdir: PathBuf,
    servers: Vec<String>,
    rewrite: Option<UriRewrite>,
}

impl SubmissionContext {
    /// Create a context with a fresh UUIDv7 id.
    pub fn new(
        workdir: impl Into<PathBuf>,
        servers: Vec<String>,
        rewrite: Option<UriRewrite>,
    ) -> Self {
        Self::with_id(Uuid::now_v7().to_string(), workdir, servers, rewrite)
    }

    pub fn with_id(
        id: impl Into<String>,
        workdir: impl Into<PathBuf>,
        servers: Vec<String>,
        rewrite: Option<UriRewrite>,
    ) -> Self {
        Self {
            id: id.into(),
            workdir: workdir.into(),
            servers,
            rewrite,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolved target servers for this submission.
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    pub fn rewrite(&self) -> Option<&UriRewrite> {
        self.rewrite.as_ref()
    }

    /// File name of the raw submitted document.
    pub fn input_file(&self) -> String {
        format!("{}.trig", self.id)
    }

    /// File name of the trusty-stamped document.
    pub fn trusty_file(&self) -> String {
        format!("{}.trusty.trig", self.id)
    }

    /// File name of the signed document.
    pub fn signed_file(&self) -> String {
        format!("{}.sign.trig", self.id)
    }

    pub fn input_path(&self) -> PathBuf {
        self.workdir.join(self.input_file())
    }

    pub fn trusty_path(&self) -> PathBuf {
        self.workdir.join(self.trusty_file())
    }

    pub fn signed_path(&self) -> PathBuf {
        self.workdir.join(self.signed_file())
    }

    /// Apply the rewrite rule (if any) to a URI.
    pub fn reported_uri(&self, uri: &str) -> String {
        match &self.rewrite {
            Some(rule) => rule.apply(uri),
            None => uri.to_string(),
        }
    }

    /// Delete all transient files. Errors are ignored.
    pub fn cleanup(&self) {
        for path in [self.input_path(), self.trusty_path(), self.signed_path()] {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for SubmissionContext {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_derive_from_id() {
        let ctx = SubmissionContext::with_id("abc", "/tmp/work", vec![], None);
        assert_eq!(ctx.input_file(), "abc.trig");
        assert_eq!(ctx.trusty_file(), "abc.trusty.trig");
        assert_eq!(ctx.signed_file(), "abc.sign.trig");
        assert_eq!(ctx.signed_path(), PathBuf::from("/tmp/work/abc.sign.trig"));
    }

    #[test]
    fn drop_removes_transient_files() {
        let dir = tempfile::tempdir().unwrap();
        {
            let ctx = SubmissionContext::new(dir.path(), vec![], None);
            std::fs::write(ctx.input_path(), "x").unwrap();
            std::fs::write(ctx.trusty_path(), "y").unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn cleanup_tolerates_missing_files() {
        let ctx = SubmissionContext::with_id("missing", "/nonexistent/dir", vec![], None);
        ctx.cleanup();
    }

    #[test]
    fn reported_uri_applies_rewrite() {
        let ctx = SubmissionContext::with_id(
            "id",
            "/tmp",
            vec![],
            UriRewrite::parse("http://a/|http://b/"),
        );
        assert_eq!(ctx.reported_uri("http://a/np1"), "http://b/np1");
    }
}
