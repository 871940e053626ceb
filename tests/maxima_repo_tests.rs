// MaximaRepo tests: created on first use, read-or-zero, upsert

mod common;

use common::*;
use jobio::maxima_repo::MaximaRepo;
use jobio::models::FilesystemMaxima;
use tempfile::TempDir;

async fn setup(dir: &TempDir) -> MaximaRepo {
    let config = config_for(dir.path());
    let repo = MaximaRepo::connect(&config.maxima_store).await.unwrap();
    repo.init().await.unwrap();
    repo
}

#[tokio::test]
async fn maxima_repo_creates_its_store_and_directory() {
    let dir = TempDir::new().unwrap();
    let repo = setup(&dir).await;
    assert!(dir.path().join("state/maxima.db").exists());
    // Second init is no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
}

#[tokio::test]
async fn maxima_repo_default_zero_then_upsert() {
    let dir = TempDir::new().unwrap();
    let repo = setup(&dir).await;
    assert_eq!(
        repo.read_maxima("alnec").await.unwrap(),
        FilesystemMaxima::default()
    );

    repo.write_maxima("alnec", &FilesystemMaxima::new([1, 2, 3, 4, 5, 6]))
        .await
        .unwrap();
    repo.write_maxima("alnec", &FilesystemMaxima::new([7, 2, 3, 4, 5, 6]))
        .await
        .unwrap();
    assert_eq!(
        repo.read_maxima("alnec").await.unwrap().values,
        [7, 2, 3, 4, 5, 6]
    );
    assert_eq!(repo.read_maxima("nobnec").await.unwrap().values, [0; 6]);
}

#[tokio::test]
async fn maxima_repo_clamps_peaks_beyond_column_range() {
    let dir = TempDir::new().unwrap();
    let repo = setup(&dir).await;
    repo.write_maxima("alnec", &FilesystemMaxima::new([u64::MAX, 0, 0, 0, 0, 1]))
        .await
        .unwrap();
    assert_eq!(
        repo.read_maxima("alnec").await.unwrap().values,
        [i64::MAX as u64, 0, 0, 0, 0, 1]
    );
}
