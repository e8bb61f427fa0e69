//! [`Storage`] of uploaded [`Document`]s.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use common::operations::{Delete, Insert};
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;
use uuid::Uuid;

use crate::domain::{document, Document};

/// Storage operation.
pub use common::Handler as Storage;

/// [`Storage`] keeping files in a local directory.
///
/// Files are laid out as `<root>/<kind>/<uuid>-<name>`, and their
/// [`document::Path`]s are relative to the `root`.
#[derive(Clone, Debug)]
pub struct Fs {
    /// Directory all the files are stored under.
    root: PathBuf,
}

impl Fs {
    /// Creates a new [`Fs`] storage rooted at the provided directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the provided [`document::Path`] against the root directory.
    ///
    /// # Errors
    ///
    /// If the [`document::Path`] is absolute or escapes the root directory.
    fn resolve(&self, path: &document::Path) -> Result<PathBuf, Error> {
        let rel = Path::new(AsRef::<str>::as_ref(path));
        let escapes = rel.as_os_str().is_empty()
            || rel.components().any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(Error::OutsideRoot(path.clone()));
        }
        Ok(self.root.join(rel))
    }
}

/// Makes the provided file name safe to be used as a path segment.
fn sanitize(name: &str) -> String {
    let name = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.trim_matches('.').is_empty() {
        "file".into()
    } else {
        name
    }
}

impl Storage<Insert<Document>> for Fs {
    type Ok = document::Path;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(doc): Insert<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        let path = document::Path::from(format!(
            "{}/{}-{}",
            doc.kind,
            Uuid::new_v4(),
            sanitize(&doc.file_name),
        ));
        let full = self.resolve(&path).map_err(tracerr::wrap!())?;

        if let Some(dir) = full.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(tracerr::from_and_wrap!(=> Error))?;
        }
        tokio::fs::write(&full, &doc.bytes)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        Ok(path)
    }
}

impl Storage<Delete<document::Path>> for Fs {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(path): Delete<document::Path>,
    ) -> Result<Self::Ok, Self::Err> {
        let full = self.resolve(&path).map_err(tracerr::wrap!())?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(tracerr::new!(Error::Io(e))),
        }
    }
}

/// [`Storage`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// I/O operation failed.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),

    /// [`document::Path`] points outside the storage root.
    #[display("`{_0}` points outside the storage root")]
    #[from(ignore)]
    OutsideRoot(#[error(not(source))] document::Path),
}

#[cfg(test)]
mod spec {
    use common::operations::{Delete, Insert};

    use crate::domain::{document, Document};

    use super::{sanitize, Error, Fs, Storage as _};

    fn tmp_root() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize("photo 1.png"), "photo_1.png");
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize(".."), "file");
        assert_eq!(sanitize(""), "file");
    }

    #[tokio::test]
    async fn stores_and_deletes() {
        let root = tmp_root();
        let fs = Fs::new(&root);

        let path = fs
            .execute(Insert(Document {
                kind: document::Kind::Insurance,
                file_name: "policy.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: b"%PDF".to_vec(),
            }))
            .await
            .unwrap();

        assert!(AsRef::<str>::as_ref(&path).starts_with("insurance/"));
        assert!(AsRef::<str>::as_ref(&path).ends_with("-policy.pdf"));
        let stored = tokio::fs::read(root.join(AsRef::<str>::as_ref(&path))).await.unwrap();
        assert_eq!(stored, b"%PDF");

        fs.execute(Delete(path.clone())).await.unwrap();
        assert!(!root.join(AsRef::<str>::as_ref(&path)).exists());

        // Deleting twice is fine.
        fs.execute(Delete(path)).await.unwrap();

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn refuses_escaping_paths() {
        let fs = Fs::new(tmp_root());

        for p in ["../secret", "/etc/passwd", "image/../../x", ""] {
            let err = fs
                .execute(Delete(document::Path::from(p.to_owned())))
                .await
                .unwrap_err();
            assert!(
                matches!(err.as_ref(), Error::OutsideRoot(_)),
                "{p}: {err}",
            );
        }
    }
}
