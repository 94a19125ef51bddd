use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

use super::display::print_import_summary;
use super::ImportArgs;
use crate::db::ContactRepository;
use crate::models::ImportOutcome;
use crate::services::ContactService;

/// Upload checks done before the file reaches the importer.
///
/// Returns a rejection outcome when the file is too large; emptiness and the
/// extension are checked by the service itself.
pub fn check_upload(path: &Path, max_bytes: u64) -> Result<Option<ImportOutcome>> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();

    if size > max_bytes {
        return Ok(Some(ImportOutcome::rejected(&format!(
            "File is too large. Maximum allowed size is {} MB.",
            max_bytes / (1024 * 1024)
        ))));
    }

    Ok(None)
}

/// Execute the import command
pub async fn run_import<R: ContactRepository>(
    service: &ContactService<R>,
    args: &ImportArgs,
    max_bytes: u64,
    cancel: &CancellationToken,
) -> Result<()> {
    let outcome = match check_upload(&args.file, max_bytes)? {
        Some(rejected) => rejected,
        None => {
            let file = File::open(&args.file).context("Failed to open CSV file")?;
            let file_name = args
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if args.dry_run {
                eprintln!("Dry run: {}", args.file.display());
            } else {
                eprintln!("Importing: {}", args.file.display());
            }

            service.import_csv(Some(file), &file_name, cancel).await?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_import_summary(&outcome, args.dry_run);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryContactRepository;
    use std::path::PathBuf;

    #[test]
    fn test_check_upload_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.csv");
        std::fs::write(&path, vec![b'x'; 2048]).unwrap();

        let rejected = check_upload(&path, 1024).unwrap().unwrap();
        assert_eq!(
            rejected.errors,
            vec!["File is too large. Maximum allowed size is 0 MB.".to_string()]
        );
        assert!(check_upload(&path, 1024 * 1024).unwrap().is_none());
    }

    #[test]
    fn test_check_upload_missing_file() {
        assert!(check_upload(&PathBuf::from("/nonexistent/x.csv"), 1024).is_err());
    }

    #[tokio::test]
    async fn test_run_import_into_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name;dob;married;phone;salary\nAnn;1990-01-01;1;555;10,5\n").unwrap();

        let service = ContactService::new(MemoryContactRepository::new());
        let args = ImportArgs {
            file: path,
            dry_run: true,
            json: false,
        };
        run_import(&service, &args, 1024 * 1024, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(service.repository().len(), 1);
    }
}
