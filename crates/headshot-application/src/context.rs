//! Composition root shared by the server and the CLI.
//!
//! Loads config and secrets, opens the local store and builds every service.
//! Nothing here is global; each binary owns one `AppContext`.

use crate::{AuthService, BlogService, CreditService, StudioUseCase};
use headshot_core::article::{ArticleRepository, SubscriberRepository};
use headshot_core::config::{AppConfig, DEFAULT_IMAGE_MODEL, SecretConfig};
use headshot_core::generation::{GenerationError, ImageGenerator};
use headshot_core::secret::SecretService;
use headshot_core::storage::{LocalStore, NamespacedStore};
use headshot_core::usage::UsageTracker;
use headshot_core::{HeadshotError, Result};
use headshot_infrastructure::paths::{HeadshotPaths, ServiceType};
use headshot_infrastructure::{
    ConfigService, FallbackArticleRepository, FallbackSubscriberRepository, FileLocalStore,
    FirebaseAuthProvider, FirestoreArticleRepository, FirestoreClient,
    FirestoreSubscriberRepository, SecretServiceImpl,
};
use headshot_interaction::GeminiImageGenerator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Root for config and data files instead of the platform directories.
    pub base_dir: Option<PathBuf>,
    /// Whether `GEMINI_API_KEY` / `FIREBASE_API_KEY` override secret.json.
    pub read_env: bool,
    /// Config the caller already loaded; read from `base_dir` when absent.
    pub config: Option<AppConfig>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            read_env: true,
            config: None,
        }
    }
}

pub struct AppContext {
    pub config: AppConfig,
    pub secrets: SecretConfig,
    pub paths: HeadshotPaths,
    pub usage: Arc<UsageTracker>,
    pub credits: Arc<CreditService>,
    pub blog: Arc<BlogService>,
    auth: Option<Arc<AuthService>>,
    studio: std::result::Result<Arc<StudioUseCase>, GenerationError>,
}

impl AppContext {
    pub async fn bootstrap(options: BootstrapOptions) -> Result<Self> {
        let base = options.base_dir.as_deref();
        let paths = HeadshotPaths::new(base);

        let config = match options.config {
            Some(config) => config,
            None => ConfigService::new(base)?.get_config()?,
        };

        let mut secret_service = SecretServiceImpl::new(base)?;
        if !options.read_env {
            secret_service = secret_service.without_env();
        }
        let secrets = secret_service
            .load_secrets()
            .await
            .map_err(HeadshotError::config)?;

        let store_path = paths
            .get_path(ServiceType::LocalStore)
            .map_err(|e| HeadshotError::config(e.to_string()))?;
        tracing::info!("[Bootstrap] Local store at {}", store_path.display());
        let local: Arc<dyn LocalStore> = Arc::new(FileLocalStore::open(store_path));

        Ok(Self::assemble(config, secrets, paths, local))
    }

    /// Builds the services from already-loaded parts.
    pub fn assemble(
        config: AppConfig,
        secrets: SecretConfig,
        paths: HeadshotPaths,
        local: Arc<dyn LocalStore>,
    ) -> Self {
        let store = NamespacedStore::new(local, config.usage.storage_prefix.clone());
        let usage = Arc::new(UsageTracker::from_settings(store.clone(), &config.usage));
        let credits = Arc::new(CreditService::new(usage.clone(), store, &config.credits));

        let blog = Arc::new(build_blog(&config, &secrets));
        let auth = secrets
            .firebase
            .as_ref()
            .filter(|fb| !fb.api_key.trim().is_empty())
            .map(|fb| {
                let provider = FirebaseAuthProvider::new(fb.api_key.clone());
                Arc::new(AuthService::new(Arc::new(provider)))
            });

        let studio = build_generator(&config, &secrets).map(|generator| {
            tracing::info!("[Bootstrap] Image model: {}", generator.model());
            Arc::new(StudioUseCase::new(
                generator,
                usage.clone(),
                config.retry.policy(),
            ))
        });
        if let Err(e) = &studio {
            tracing::warn!("[Bootstrap] Studio disabled: {}", e);
        }

        Self {
            config,
            secrets,
            paths,
            usage,
            credits,
            blog,
            auth,
            studio,
        }
    }

    /// The studio, or the reason it is unavailable (missing API key).
    pub fn studio(&self) -> Result<&Arc<StudioUseCase>> {
        self.studio.as_ref().map_err(|e| e.clone().into())
    }

    pub fn auth(&self) -> Result<&Arc<AuthService>> {
        self.auth.as_ref().ok_or_else(|| {
            HeadshotError::config(
                "No Firebase API key configured. Add it to secret.json or set FIREBASE_API_KEY.",
            )
        })
    }

    /// Gemini key and model to hand to a browser client, if configured.
    pub fn client_api_config(&self) -> Option<(String, String)> {
        let gemini = self
            .secrets
            .gemini
            .as_ref()
            .filter(|g| !g.api_key.trim().is_empty())?;
        let model = self
            .config
            .generation
            .model
            .clone()
            .or_else(|| gemini.model_name.clone())
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        Some((gemini.api_key.clone(), model))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.paths.get_path(ServiceType::Logs).ok()
    }
}

fn build_generator(
    config: &AppConfig,
    secrets: &SecretConfig,
) -> std::result::Result<Arc<dyn ImageGenerator>, GenerationError> {
    let mut generator =
        GeminiImageGenerator::from_secrets(secrets, config.generation.model.as_deref())?;
    if let Some(base_url) = &config.generation.base_url {
        generator = generator.with_base_url(base_url);
    }
    Ok(Arc::new(generator))
}

fn build_blog(config: &AppConfig, secrets: &SecretConfig) -> BlogService {
    let firebase = secrets.firebase.as_ref();
    let project_id = config
        .document_store
        .project_id
        .clone()
        .or_else(|| firebase.and_then(|fb| fb.project_id.clone()));

    let Some(project_id) = project_id else {
        tracing::info!("[Bootstrap] No document store configured, blog uses built-in articles");
        return BlogService::new(
            Arc::new(FallbackArticleRepository::offline()),
            Arc::new(FallbackSubscriberRepository::offline()),
        );
    };

    let api_key = firebase
        .map(|fb| fb.api_key.clone())
        .filter(|key| !key.trim().is_empty());
    let mut client = FirestoreClient::new(project_id.clone(), api_key);
    if let Some(base_url) = &config.document_store.base_url {
        client = client.with_base_url(base_url);
    }
    let client = Arc::new(client);
    tracing::info!("[Bootstrap] Blog backed by document store project {}", project_id);

    let articles: Arc<dyn ArticleRepository> =
        Arc::new(FirestoreArticleRepository::new(client.clone()));
    let subscribers: Arc<dyn SubscriberRepository> =
        Arc::new(FirestoreSubscriberRepository::new(client));
    BlogService::new(
        Arc::new(FallbackArticleRepository::new(articles)),
        Arc::new(FallbackSubscriberRepository::new(subscribers)),
    )
}

/// Convenience for callers that only have a path.
pub async fn bootstrap_at(base_dir: &Path) -> Result<AppContext> {
    AppContext::bootstrap(BootstrapOptions {
        base_dir: Some(base_dir.to_path_buf()),
        read_env: false,
        config: None,
    })
    .await
}
