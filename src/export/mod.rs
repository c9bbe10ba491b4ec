pub mod json;

pub use json::{Backup, BackupEntry, create_backup, export_backup_to_path, import_backup, restore_backup};
