use std::path::{Path, PathBuf};

use mongodb::bson::{doc, Document};
use mongodb::options::UpdateOptions;
use mongodb::{Client, Collection};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{AppError, LedgerError};
use crate::schemas::{Expense, Ledger, MemberName, NewExpense};

#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
}

impl MemoryStore {
    pub fn new(ledger: Ledger) -> Self {
        MemoryStore {
            ledger: Mutex::new(ledger),
        }
    }

    async fn snapshot(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }

    async fn modify<T>(
        &self,
        change: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    ) -> Result<T, AppError> {
        let mut ledger = self.ledger.lock().await;
        Ok(change(&mut *ledger)?)
    }
}

/// Keeps the whole ledger in one pretty-printed JSON file. A missing file
/// reads as an empty ledger.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Ledger, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Ledger::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, ledger: &Ledger) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(ledger)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<Ledger, AppError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn modify<T>(
        &self,
        change: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    ) -> Result<T, AppError> {
        let _guard = self.lock.lock().await;
        let mut ledger = self.read().await?;
        let output = change(&mut ledger)?;
        self.write(&ledger).await?;
        Ok(output)
    }
}

/// One document per ledger in the `Ledgers` collection, keyed by `id`.
/// Changes are validated against the loaded document and then applied with
/// `$push`/`$pull`.
pub struct MongoStore {
    ledgers: Collection<Ledger>,
    ledger_id: String,
    lock: Mutex<()>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str, ledger_id: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(MongoStore {
            ledgers: client.database(database).collection("Ledgers"),
            ledger_id: ledger_id.to_string(),
            lock: Mutex::new(()),
        })
    }

    fn filter(&self) -> Document {
        doc! { "id": self.ledger_id.as_str() }
    }

    async fn load(&self) -> Result<Ledger, AppError> {
        Ok(self
            .ledgers
            .find_one(self.filter(), None)
            .await?
            .unwrap_or_default())
    }

    async fn update(&self, update: Document) -> Result<(), AppError> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.ledgers
            .update_one(self.filter(), update, options)
            .await?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<Ledger, AppError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn add_member(&self, name: &str) -> Result<Vec<MemberName>, AppError> {
        let _guard = self.lock.lock().await;
        let mut ledger = self.load().await?;
        let members = ledger.add_member(name)?.to_vec();
        self.update(doc! { "$push": { "members": name } }).await?;
        Ok(members)
    }

    async fn add_expense(&self, new: NewExpense) -> Result<Expense, AppError> {
        let _guard = self.lock.lock().await;
        let mut ledger = self.load().await?;
        let expense = ledger.add_expense(new)?;
        let entry = bson::to_bson(&expense)?;
        self.update(doc! { "$push": { "expenses": entry.clone(), "transactions": entry } })
            .await?;
        Ok(expense)
    }

    async fn delete_expense(&self, id: &str) -> Result<Expense, AppError> {
        let _guard = self.lock.lock().await;
        let mut ledger = self.load().await?;
        let removed = ledger.delete_expense(id)?;
        self.update(doc! {
            "$pull": { "expenses": { "id": id }, "transactions": { "id": id } }
        })
        .await?;
        Ok(removed)
    }
}

pub enum Store {
    Memory(MemoryStore),
    File(JsonFileStore),
    Mongo(MongoStore),
}

impl Store {
    pub async fn connect(config: &StorageConfig) -> Result<Self, AppError> {
        match config.backend {
            StorageBackend::Memory => Ok(Store::Memory(MemoryStore::default())),
            StorageBackend::File => Ok(Store::File(JsonFileStore::new(&config.path))),
            StorageBackend::Mongodb => {
                let uri = config.mongodb_uri.as_deref().ok_or_else(|| {
                    AppError::Config("storage.mongodb_uri is required for mongodb".to_string())
                })?;
                let store = MongoStore::connect(uri, &config.database, &config.ledger_id).await?;
                Ok(Store::Mongo(store))
            }
        }
    }

    /// A consistent copy of the current members and expenses.
    pub async fn snapshot(&self) -> Result<Ledger, AppError> {
        match self {
            Store::Memory(store) => Ok(store.snapshot().await),
            Store::File(store) => store.snapshot().await,
            Store::Mongo(store) => store.snapshot().await,
        }
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn add_member(&self, name: &str) -> Result<Vec<MemberName>, AppError> {
        let add = |ledger: &mut Ledger| ledger.add_member(name).map(<[MemberName]>::to_vec);
        let members = match self {
            Store::Memory(store) => store.modify(add).await?,
            Store::File(store) => store.modify(add).await?,
            Store::Mongo(store) => store.add_member(name).await?,
        };
        info!(members = members.len(), "member added");
        Ok(members)
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn add_expense(&self, new: NewExpense) -> Result<Expense, AppError> {
        let expense = match self {
            Store::Memory(store) => store.modify(|ledger| ledger.add_expense(new)).await?,
            Store::File(store) => store.modify(|ledger| ledger.add_expense(new)).await?,
            Store::Mongo(store) => store.add_expense(new).await?,
        };
        info!(id = %expense.id, paid_by = %expense.paid_by, amount = %expense.amount, "expense added");
        Ok(expense)
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn delete_expense(&self, id: &str) -> Result<Expense, AppError> {
        let removed = match self {
            Store::Memory(store) => store.modify(|ledger| ledger.delete_expense(id)).await?,
            Store::File(store) => store.modify(|ledger| ledger.delete_expense(id)).await?,
            Store::Mongo(store) => store.delete_expense(id).await?,
        };
        info!(id, "expense deleted");
        Ok(removed)
    }
}
