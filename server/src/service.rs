use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{error, info, trace, warn};
use thiserror::Error;

use chrono::NaiveDate;
use database_handler::{DbConnection, DbPool};
use records::models::{
    Account, AccountChanges, AccountTransaction, NewAccount, NewAccountTransaction,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DieselError> for ServiceError {
    fn from(err: DieselError) -> ServiceError {
        match err {
            DieselError::NotFound => ServiceError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ServiceError::DuplicateKey(info.message().to_string())
            }
            other => {
                error!("Storage layer failure: {}", other);
                ServiceError::Storage(other.to_string())
            }
        }
    }
}

impl From<PoolError> for ServiceError {
    fn from(err: PoolError) -> ServiceError {
        error!("Failed to check out a database connection: {}", err);
        ServiceError::Storage(err.to_string())
    }
}

/// Account operations: stateless reads and check-then-act writes. The
/// writes themselves are single statements, so a concurrent create racing
/// past the existence check still ends up as DuplicateKey via the unique
/// constraint rather than a stored duplicate.
#[derive(Clone)]
pub struct AccountService {
    pool: DbPool,
}

impl AccountService {
    pub fn new(pool: DbPool) -> AccountService {
        AccountService { pool }
    }

    fn connection(&self) -> Result<DbConnection, ServiceError> {
        Ok(DbConnection::from_pool(&self.pool)?)
    }

    pub fn all(&self) -> Result<Vec<Account>, ServiceError> {
        info!("Fetching all accounts");
        let accounts = self.connection()?.all_accounts()?;
        trace!("Found {} accounts", accounts.len());
        Ok(accounts)
    }

    pub fn by_id(&self, id: i64) -> Result<Account, ServiceError> {
        info!("Fetching account with id {}", id);
        match self.connection()?.account_by_id(id) {
            Err(DieselError::NotFound) => {
                warn!("Account with id {} not found", id);
                Err(ServiceError::NotFound)
            }
            other => Ok(other?),
        }
    }

    pub fn by_number(&self, account_no: &str) -> Result<Account, ServiceError> {
        info!("Fetching account with number {}", account_no);
        match self.connection()?.account_by_number(account_no) {
            Err(DieselError::NotFound) => {
                warn!("Account with number {} not found", account_no);
                Err(ServiceError::NotFound)
            }
            other => Ok(other?),
        }
    }

    pub fn by_type(&self, account_type: &str) -> Result<Vec<Account>, ServiceError> {
        info!("Fetching accounts with type {}", account_type);
        Ok(self.connection()?.accounts_by_type(account_type)?)
    }

    pub fn by_currency(&self, currency: &str) -> Result<Vec<Account>, ServiceError> {
        info!("Fetching accounts with currency {}", currency);
        Ok(self.connection()?.accounts_by_currency(currency)?)
    }

    pub fn create(&self, details: NewAccount) -> Result<Account, ServiceError> {
        details.validate().map_err(ServiceError::Validation)?;
        info!("Creating new account {}", details.account_no);
        let con = self.connection()?;
        if con.account_number_exists(&details.account_no)? {
            error!("Account with number {} already exists", details.account_no);
            return Err(ServiceError::DuplicateKey(format!(
                "account number {} is already in use",
                details.account_no
            )));
        }
        let account = con.insert_account(&details)?;
        info!("Created account with id {}", account.id);
        Ok(account)
    }

    pub fn update(&self, id: i64, changes: AccountChanges) -> Result<Account, ServiceError> {
        changes.validate().map_err(ServiceError::Validation)?;
        info!("Updating account with id {}", id);
        match self.connection()?.update_account(id, &changes) {
            Err(DieselError::NotFound) => {
                warn!("Account with id {} not found for update", id);
                Err(ServiceError::NotFound)
            }
            other => {
                let account = other?;
                info!("Updated account {}", account.account_no);
                Ok(account)
            }
        }
    }

    pub fn delete(&self, id: i64) -> Result<(), ServiceError> {
        info!("Deleting account with id {}", id);
        let deleted = self.connection()?.delete_account(id)?;
        if deleted == 0 {
            warn!("Account with id {} not found for deletion", id);
            return Err(ServiceError::NotFound);
        }
        info!("Deleted account with id {}", id);
        Ok(())
    }
}

/// Transaction operations. Orphan transactions are allowed: the account
/// number is never checked against the accounts table.
#[derive(Clone)]
pub struct TransactionService {
    pool: DbPool,
}

impl TransactionService {
    pub fn new(pool: DbPool) -> TransactionService {
        TransactionService { pool }
    }

    fn connection(&self) -> Result<DbConnection, ServiceError> {
        Ok(DbConnection::from_pool(&self.pool)?)
    }

    pub fn all(&self) -> Result<Vec<AccountTransaction>, ServiceError> {
        info!("Fetching all transactions");
        let transactions = self.connection()?.all_transactions()?;
        trace!("Found {} transactions", transactions.len());
        Ok(transactions)
    }

    pub fn by_id(&self, id: i64) -> Result<AccountTransaction, ServiceError> {
        info!("Fetching transaction with id {}", id);
        match self.connection()?.transaction_by_id(id) {
            Err(DieselError::NotFound) => {
                warn!("Transaction with id {} not found", id);
                Err(ServiceError::NotFound)
            }
            other => Ok(other?),
        }
    }

    pub fn for_account(&self, account_no: &str) -> Result<Vec<AccountTransaction>, ServiceError> {
        info!("Fetching transactions for account {}", account_no);
        Ok(self.connection()?.transactions_for_account(account_no)?)
    }

    pub fn in_range(
        &self,
        account_no: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountTransaction>, ServiceError> {
        info!(
            "Fetching transactions for account {} between {} and {}",
            account_no, start_date, end_date
        );
        Ok(self
            .connection()?
            .transactions_in_range(account_no, start_date, end_date)?)
    }

    pub fn credits(&self, account_no: &str) -> Result<Vec<AccountTransaction>, ServiceError> {
        info!("Fetching credit transactions for account {}", account_no);
        Ok(self.connection()?.transactions_by_type(account_no, "Credit")?)
    }

    pub fn debits(&self, account_no: &str) -> Result<Vec<AccountTransaction>, ServiceError> {
        info!("Fetching debit transactions for account {}", account_no);
        Ok(self.connection()?.transactions_by_type(account_no, "Debit")?)
    }

    pub fn by_currency(&self, currency: &str) -> Result<Vec<AccountTransaction>, ServiceError> {
        info!("Fetching transactions with currency {}", currency);
        Ok(self.connection()?.transactions_by_currency(currency)?)
    }

    pub fn create(
        &self,
        details: NewAccountTransaction,
    ) -> Result<AccountTransaction, ServiceError> {
        details.validate().map_err(ServiceError::Validation)?;
        info!("Creating new transaction for account {}", details.account_no);
        let transaction = self.connection()?.insert_transaction(&details)?;
        info!(
            "Created transaction with id {} for account {}",
            transaction.id, transaction.account_no
        );
        Ok(transaction)
    }

    pub fn update(
        &self,
        id: i64,
        details: NewAccountTransaction,
    ) -> Result<AccountTransaction, ServiceError> {
        details.validate().map_err(ServiceError::Validation)?;
        info!("Updating transaction with id {}", id);
        match self.connection()?.update_transaction(id, &details) {
            Err(DieselError::NotFound) => {
                warn!("Transaction with id {} not found for update", id);
                Err(ServiceError::NotFound)
            }
            other => Ok(other?),
        }
    }

    pub fn delete(&self, id: i64) -> Result<(), ServiceError> {
        info!("Deleting transaction with id {}", id);
        let deleted = self.connection()?.delete_transaction(id)?;
        if deleted == 0 {
            warn!("Transaction with id {} not found for deletion", id);
            return Err(ServiceError::NotFound);
        }
        info!("Deleted transaction with id {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = ServiceError::from(DieselError::NotFound);
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[test]
    fn unique_violation_maps_to_duplicate_key() {
        let err = ServiceError::from(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        ));
        match err {
            ServiceError::DuplicateKey(msg) => assert!(msg.contains("duplicate key")),
            other => panic!("expected DuplicateKey, got {:?}", other),
        }
    }

    #[test]
    fn other_database_errors_map_to_storage() {
        let err = ServiceError::from(DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_string()),
        ));
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
