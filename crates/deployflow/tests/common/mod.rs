use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// ビルドコンテキストと compose マニフェストを持つ一時プロジェクト
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// サービスごとのビルドコンテキストと、build を持つマニフェストを作成
    pub fn with_services(services: &[&str]) -> Self {
        let project = Self::new();
        let mut compose = String::from("services:\n");
        for service in services {
            fs::create_dir(project.root.path().join(service)).unwrap();
            fs::write(
                project.root.path().join(service).join("Dockerfile"),
                "FROM alpine\n",
            )
            .unwrap();
            compose.push_str(&format!("  {}:\n    build: ./{}\n", service, service));
        }
        project.write_manifest(&compose);
        project
    }

    #[allow(dead_code)]
    pub fn write_pipeline_kdl(&self, content: &str) {
        fs::write(self.root.path().join("deployflow.kdl"), content).unwrap();
    }

    /// `.deployflow/deployflow.kdl` に書き込む
    #[allow(dead_code)]
    pub fn write_hidden_pipeline_kdl(&self, content: &str) {
        let dir = self.root.path().join(".deployflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("deployflow.kdl"), content).unwrap();
    }

    pub fn write_manifest(&self, content: &str) {
        fs::write(self.manifest_path(), content).unwrap();
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.path().join("docker-compose.yml")
    }

    #[allow(dead_code)]
    pub fn read_manifest(&self) -> String {
        fs::read_to_string(self.manifest_path()).unwrap()
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }
}
