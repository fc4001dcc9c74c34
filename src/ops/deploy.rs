//! Static export upload over FTP
//!
//! Mirrors the export directory onto the remote root, directory by
//! directory, then uploads the web server's root configuration file last.
//! A failed upload is logged and the rest of the tree still goes up; a
//! directory that cannot be created skips its subtree.

use std::fs::File;
use std::path::{Component, Path};

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use walkdir::WalkDir;

use crate::config::DeployConfig;
use crate::logger;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("{0} is not set")]
    MissingSetting(&'static str),
    #[error("local export directory `{0}` does not exist")]
    MissingExport(String),
    #[error(transparent)]
    Ftp(#[from] FtpError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Remote file system operations the mirror needs
pub trait RemoteFs {
    /// Create a directory; an existing one is not an error
    fn make_dir(&mut self, remote: &str) -> Result<(), DeployError>;

    fn upload(&mut self, local: &Path, remote: &str) -> Result<(), DeployError>;
}

/// Counts of what a deploy did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub dirs_created: usize,
    pub files_uploaded: usize,
    /// Remote paths that failed
    pub failures: Vec<String>,
}

/// FTP session implementing [`RemoteFs`]
pub struct FtpRemote {
    stream: FtpStream,
    root: String,
}

impl FtpRemote {
    pub fn connect(config: &DeployConfig) -> Result<Self, DeployError> {
        let host = config
            .ftp_host
            .as_deref()
            .ok_or(DeployError::MissingSetting("FTP_HOST"))?;
        let user = config
            .ftp_user
            .as_deref()
            .ok_or(DeployError::MissingSetting("FTP_USER"))?;
        let password = config
            .ftp_password
            .as_deref()
            .ok_or(DeployError::MissingSetting("FTP_PASSWORD"))?;

        let addr = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:21")
        };
        let mut stream = FtpStream::connect(addr.as_str())?;
        stream.login(user, password)?;
        stream.transfer_type(FileType::Binary)?;
        logger::log_info(&format!("FTP connection ready: {addr}"));

        Ok(Self {
            stream,
            root: config.remote_root.clone(),
        })
    }

    pub fn quit(mut self) {
        if let Err(e) = self.stream.quit() {
            logger::log_warning(&format!("FTP quit failed: {e}"));
        }
    }
}

impl RemoteFs for FtpRemote {
    fn make_dir(&mut self, remote: &str) -> Result<(), DeployError> {
        match self.stream.mkdir(remote) {
            Ok(()) => Ok(()),
            Err(mkdir_error) => {
                // already present if we can enter it
                if self.stream.cwd(remote).is_ok() {
                    self.stream.cwd(&self.root)?;
                    Ok(())
                } else {
                    Err(mkdir_error.into())
                }
            }
        }
    }

    fn upload(&mut self, local: &Path, remote: &str) -> Result<(), DeployError> {
        let mut file = File::open(local).map_err(|source| DeployError::Io {
            path: local.display().to_string(),
            source,
        })?;
        self.stream.put_file(remote, &mut file)?;
        Ok(())
    }
}

/// Join a remote root and a local relative path with `/`
pub fn remote_path(root: &str, relative: &Path) -> String {
    let mut path = root.trim_end_matches('/').to_string();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            path.push('/');
            path.push_str(&part.to_string_lossy());
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// Mirror `config.local_root` to `config.remote_root`, root configuration file last
pub fn deploy(remote: &mut dyn RemoteFs, config: &DeployConfig) -> Result<DeployReport, DeployError> {
    let local_root = Path::new(&config.local_root);
    if !local_root.is_dir() {
        return Err(DeployError::MissingExport(config.local_root.clone()));
    }

    let root_config = Path::new(&config.root_config_file);
    let root_config_name = root_config.file_name();
    let mut report = DeployReport::default();

    let mut entries = WalkDir::new(local_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();
    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger::log_error(&format!("Error reading directory: {e}"));
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(local_root) else {
            continue;
        };
        let target = remote_path(&config.remote_root, relative);

        if entry.file_type().is_dir() {
            match remote.make_dir(&target) {
                Ok(()) => {
                    logger::log_info(&format!("Created remote directory: {target}"));
                    report.dirs_created += 1;
                }
                Err(e) => {
                    logger::log_error(&format!("Error creating remote directory {target}: {e}"));
                    report.failures.push(target);
                    entries.skip_current_dir();
                }
            }
            continue;
        }

        // uploaded separately, after everything else
        if entry.depth() == 1 && root_config_name.is_some_and(|name| entry.file_name() == name) {
            continue;
        }
        upload_one(remote, entry.path(), &target, &mut report);
    }

    match root_config_name {
        Some(name) if root_config.is_file() => {
            let target = remote_path(&config.remote_root, Path::new(name));
            upload_one(remote, root_config, &target, &mut report);
        }
        _ => logger::log_warning(&format!(
            "Root configuration file {} not found, skipped",
            config.root_config_file
        )),
    }

    logger::log_info(&format!(
        "FTP upload complete: {} file(s), {} director(ies), {} failure(s)",
        report.files_uploaded,
        report.dirs_created,
        report.failures.len()
    ));
    Ok(report)
}

fn upload_one(remote: &mut dyn RemoteFs, local: &Path, target: &str, report: &mut DeployReport) {
    match remote.upload(local, target) {
        Ok(()) => {
            logger::log_info(&format!("Uploaded file: {target}"));
            report.files_uploaded += 1;
        }
        Err(e) => {
            logger::log_error(&format!(
                "Error uploading file {} to {target}: {e}",
                local.display()
            ));
            report.failures.push(target.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingRemote {
        ops: Vec<String>,
        fail_uploads: Vec<&'static str>,
        fail_dirs: Vec<&'static str>,
    }

    impl RemoteFs for RecordingRemote {
        fn make_dir(&mut self, remote: &str) -> Result<(), DeployError> {
            if self.fail_dirs.iter().any(|d| *d == remote) {
                return Err(DeployError::MissingSetting("permission"));
            }
            self.ops.push(format!("mkdir {remote}"));
            Ok(())
        }

        fn upload(&mut self, _local: &Path, remote: &str) -> Result<(), DeployError> {
            if self.fail_uploads.iter().any(|u| *u == remote) {
                return Err(DeployError::MissingSetting("quota"));
            }
            self.ops.push(format!("put {remote}"));
            Ok(())
        }
    }

    fn export_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(out.join("blog/mate")).unwrap();
        std::fs::create_dir_all(out.join("img")).unwrap();
        std::fs::write(out.join("index.html"), "home").unwrap();
        std::fs::write(out.join("blog/mate/index.html"), "post").unwrap();
        std::fs::write(out.join("img/logo.png"), "png").unwrap();
        std::fs::write(dir.path().join(".htaccess"), "RewriteEngine On").unwrap();
        dir
    }

    fn config_for(dir: &tempfile::TempDir) -> DeployConfig {
        DeployConfig {
            ftp_host: None,
            ftp_user: None,
            ftp_password: None,
            local_root: dir.path().join("out").to_string_lossy().into_owned(),
            remote_root: "/".to_string(),
            root_config_file: dir.path().join(".htaccess").to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn test_remote_path() {
        assert_eq!(remote_path("/", Path::new("img/logo.png")), "/img/logo.png");
        assert_eq!(remote_path("/public_html/", Path::new("a")), "/public_html/a");
        assert_eq!(remote_path("/", Path::new("")), "/");
    }

    #[test]
    fn test_mirrors_tree_and_uploads_root_config_last() {
        let dir = export_tree();
        let mut remote = RecordingRemote::default();

        let report = deploy(&mut remote, &config_for(&dir)).unwrap();

        assert_eq!(
            remote.ops,
            vec![
                "mkdir /blog",
                "mkdir /blog/mate",
                "put /blog/mate/index.html",
                "mkdir /img",
                "put /img/logo.png",
                "put /index.html",
                "put /.htaccess",
            ]
        );
        assert_eq!(report.files_uploaded, 4);
        assert_eq!(report.dirs_created, 3);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_failed_upload_does_not_stop_the_rest() {
        let dir = export_tree();
        let mut remote = RecordingRemote {
            fail_uploads: vec!["/img/logo.png"],
            ..RecordingRemote::default()
        };

        let report = deploy(&mut remote, &config_for(&dir)).unwrap();
        assert_eq!(report.failures, vec!["/img/logo.png".to_string()]);
        assert_eq!(remote.ops.last().map(String::as_str), Some("put /.htaccess"));
        assert!(remote.ops.contains(&"put /index.html".to_string()));
    }

    #[test]
    fn test_failed_directory_skips_subtree() {
        let dir = export_tree();
        let mut remote = RecordingRemote {
            fail_dirs: vec!["/blog"],
            ..RecordingRemote::default()
        };

        let report = deploy(&mut remote, &config_for(&dir)).unwrap();
        assert!(!remote.ops.iter().any(|op| op.contains("/blog")));
        assert_eq!(report.failures, vec!["/blog".to_string()]);
        assert_eq!(report.files_uploaded, 3);
    }

    #[test]
    fn test_missing_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(&dir);
        config.local_root = dir.path().join("nope").to_string_lossy().into_owned();
        let mut remote = RecordingRemote::default();
        assert!(matches!(
            deploy(&mut remote, &config),
            Err(DeployError::MissingExport(_))
        ));
    }
}
