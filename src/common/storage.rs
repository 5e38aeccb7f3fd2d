// src/common/storage.rs

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::common::error::AppError;

/// Prefixo público sob o qual o diretório de uploads é servido.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Diretório único onde ficam fotos de produtos e planilhas importadas.
#[derive(Clone, Debug)]
pub struct UploadStore {
    root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub disk_path: PathBuf,
    pub public_path: String,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Grava `bytes` com um nome gerado (`{prefix}-{uuid}.{ext}`).
    pub async fn save(
        &self,
        prefix: &str,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, AppError> {
        self.ensure_dir()
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar diretório de uploads: {}", e))?;

        let file_name = match original_name.and_then(sanitized_extension) {
            Some(ext) => format!("{}-{}.{}", prefix, Uuid::new_v4(), ext),
            None => format!("{}-{}", prefix, Uuid::new_v4()),
        };
        let disk_path = self.root.join(&file_name);
        tokio::fs::write(&disk_path, bytes)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao gravar '{}': {}", disk_path.display(), e))?;

        Ok(StoredFile {
            disk_path,
            public_path: format!("{}/{}", PUBLIC_PREFIX, file_name),
        })
    }

    /// Mapeia um caminho público de volta ao disco. Só aceita nomes simples,
    /// sem separadores.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .map(|rest| rest.trim_start_matches('/'))?;
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Remove um arquivo sem nunca falhar a requisição: erros só vão para o log.
    pub async fn remove_best_effort(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!("Caminho de upload ignorado na limpeza: {}", public_path);
            return;
        };
        remove_file_best_effort(&path).await;
    }
}

pub async fn remove_file_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Arquivo removido: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Falha ao remover '{}': {}", path.display(), e),
    }
}

/// Extensão em minúsculas, apenas alfanumérica e curta.
pub fn sanitized_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(sanitized_extension("Foto.JPG").as_deref(), Some("jpg"));
        assert_eq!(sanitized_extension("planilha.xlsx").as_deref(), Some("xlsx"));
        assert_eq!(sanitized_extension("sem_extensao"), None);
        assert_eq!(sanitized_extension("x.p$p"), None);
    }

    #[test]
    fn resolve_rejects_traversal() {
        let store = UploadStore::new("uploads");
        assert_eq!(
            store.resolve("/uploads/photo-1.png"),
            Some(PathBuf::from("uploads").join("photo-1.png"))
        );
        assert_eq!(store.resolve("/uploads/../Cargo.toml"), None);
        assert_eq!(store.resolve("/uploads/a/b.png"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
    }

    #[tokio::test]
    async fn save_then_remove() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&dir);
        let stored = store.save("photo", Some("cafe.png"), b"png").await.unwrap();
        assert!(stored.public_path.starts_with("/uploads/photo-"));
        assert!(stored.public_path.ends_with(".png"));
        assert!(stored.disk_path.exists());

        store.remove_best_effort(&stored.public_path).await;
        assert!(!stored.disk_path.exists());
        // Segunda remoção não falha.
        store.remove_best_effort(&stored.public_path).await;
        let _ = std::fs::remove_dir_all(&dir);
    }
}
