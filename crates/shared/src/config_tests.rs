use crate::config::{AppConfig, StorageBackendSettings};

#[test]
fn test_load_local_backend_from_env() {
    temp_env::with_vars(
        [
            ("FILEITEM__JWT__SECRET", Some("secret")),
            ("FILEITEM__STORAGE__BACKEND__TYPE", Some("local")),
            ("FILEITEM__STORAGE__BACKEND__ROOT", Some("/var/lib/fileitem")),
            ("FILEITEM__STORAGE__PATH_PREFIX", Some("files/")),
        ],
        || {
            let config = AppConfig::load().expect("config should load");

            assert_eq!(config.jwt.secret, "secret");
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.storage.path_prefix, "files/");
            assert_eq!(config.storage.max_files, 5);
            assert_eq!(config.storage.max_file_size, 250 * 1024 * 1024);
            assert!(config.storage.quota_bytes.is_none());
            match config.storage.backend {
                StorageBackendSettings::Local { root } => assert_eq!(root, "/var/lib/fileitem"),
                StorageBackendSettings::S3 { .. } => panic!("expected local backend"),
            }
        },
    );
}

#[test]
fn test_load_s3_backend_from_env() {
    temp_env::with_vars(
        [
            ("FILEITEM__JWT__SECRET", Some("secret")),
            ("FILEITEM__STORAGE__BACKEND__TYPE", Some("s3")),
            ("FILEITEM__STORAGE__BACKEND__REGION", Some("eu-central-1")),
            ("FILEITEM__STORAGE__BACKEND__BUCKET", Some("items")),
            ("FILEITEM__STORAGE__BACKEND__ACCESS_KEY_ID", Some("key")),
            ("FILEITEM__STORAGE__BACKEND__SECRET_ACCESS_KEY", Some("shh")),
        ],
        || {
            let config = AppConfig::load().expect("config should load");

            match config.storage.backend {
                StorageBackendSettings::S3 {
                    region,
                    bucket,
                    endpoint,
                    ..
                } => {
                    assert_eq!(region, "eu-central-1");
                    assert_eq!(bucket, "items");
                    assert!(endpoint.is_none());
                }
                StorageBackendSettings::Local { .. } => panic!("expected s3 backend"),
            }
        },
    );
}

#[test]
fn test_missing_storage_section_fails() {
    temp_env::with_vars(
        [
            ("FILEITEM__JWT__SECRET", Some("secret")),
            ("FILEITEM__STORAGE__BACKEND__TYPE", None::<&str>),
            ("FILEITEM__STORAGE__BACKEND__ROOT", None),
        ],
        || {
            assert!(AppConfig::load().is_err());
        },
    );
}
