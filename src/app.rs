use crate::access::policy::AccessPolicy;
use crate::error::AppError;
use crate::settings::AppSettings;
use crate::store::Store;

/// Everything a command needs: the open store and the loaded settings.
pub struct App {
    pub store: Store,
    pub settings: AppSettings,
}

impl App {
    pub fn new(store: Store, settings: AppSettings) -> Self {
        Self { store, settings }
    }

    /// Opens the configured database and seeds the administrator account.
    pub fn open(settings: AppSettings) -> Result<Self, AppError> {
        let store = Store::open(std::path::Path::new(&settings.database_path))?;
        store.ensure_seed_admin(&settings.seed_admin_username, &settings.seed_admin_password)?;
        Ok(Self::new(store, settings))
    }

    /// In-memory store with the seed administrator, for tests and demos.
    pub fn in_memory(settings: AppSettings) -> Result<Self, AppError> {
        let store = Store::open_in_memory()?;
        store.ensure_seed_admin(&settings.seed_admin_username, &settings.seed_admin_password)?;
        Ok(Self::new(store, settings))
    }

    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.settings.max_administrators)
    }
}
