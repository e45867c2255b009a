use chrono::NaiveDate;
use diesel::dsl::{exists, select};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use log::trace;

use records::models::{
    Account, AccountChanges, AccountTransaction, NewAccount, NewAccountTransaction,
};
use records::schema::{account_transactions, accounts};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for the given database URL. The URL is passed in
/// explicitly so callers decide where it comes from (env, decrypted config).
pub fn build_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().build(manager)
}

/// One checked-out connection. Every query is a direct pass-through to the
/// database and reports outcomes as `QueryResult`; interpretation of a
/// missing row is left to the service layer.
pub struct DbConnection {
    connection: PooledConnection<ConnectionManager<PgConnection>>,
}

impl DbConnection {
    pub fn from_pool(pool: &DbPool) -> Result<DbConnection, PoolError> {
        let connection = pool.get()?;
        Ok(DbConnection { connection })
    }

    pub fn insert_account(&self, details: &NewAccount) -> QueryResult<Account> {
        diesel::insert_into(accounts::table)
            .values(details)
            .get_result(&self.connection)
    }

    pub fn account_by_id(&self, id: i64) -> QueryResult<Account> {
        accounts::table.find(id).get_result(&self.connection)
    }

    pub fn account_by_number(&self, account_no: &str) -> QueryResult<Account> {
        accounts::table
            .filter(accounts::account_no.eq(account_no))
            .first(&self.connection)
    }

    pub fn all_accounts(&self) -> QueryResult<Vec<Account>> {
        accounts::table
            .order(accounts::id.asc())
            .load(&self.connection)
    }

    pub fn accounts_by_type(&self, account_type: &str) -> QueryResult<Vec<Account>> {
        accounts::table
            .filter(accounts::account_type.eq(account_type))
            .order(accounts::id.asc())
            .load(&self.connection)
    }

    pub fn accounts_by_currency(&self, currency: &str) -> QueryResult<Vec<Account>> {
        accounts::table
            .filter(accounts::currency.eq(currency))
            .order(accounts::id.asc())
            .load(&self.connection)
    }

    pub fn account_exists(&self, id: i64) -> QueryResult<bool> {
        select(exists(accounts::table.filter(accounts::id.eq(id)))).get_result(&self.connection)
    }

    pub fn account_number_exists(&self, account_no: &str) -> QueryResult<bool> {
        select(exists(
            accounts::table.filter(accounts::account_no.eq(account_no)),
        ))
        .get_result(&self.connection)
    }

    /// Overwrites the mutable columns of one account. The changeset carries
    /// no account number, so that column is never touched.
    pub fn update_account(&self, id: i64, changes: &AccountChanges) -> QueryResult<Account> {
        diesel::update(accounts::table.find(id))
            .set(changes)
            .get_result(&self.connection)
    }

    /// Removes one account, returning the number of rows deleted. The row
    /// count makes delete-if-present a single atomic statement.
    pub fn delete_account(&self, id: i64) -> QueryResult<usize> {
        diesel::delete(accounts::table.find(id)).execute(&self.connection)
    }

    pub fn insert_transaction(
        &self,
        details: &NewAccountTransaction,
    ) -> QueryResult<AccountTransaction> {
        diesel::insert_into(account_transactions::table)
            .values(details)
            .get_result(&self.connection)
    }

    pub fn transaction_by_id(&self, id: i64) -> QueryResult<AccountTransaction> {
        account_transactions::table
            .find(id)
            .get_result(&self.connection)
    }

    pub fn all_transactions(&self) -> QueryResult<Vec<AccountTransaction>> {
        account_transactions::table
            .order(account_transactions::id.asc())
            .load(&self.connection)
    }

    pub fn transactions_for_account(&self, account_no: &str) -> QueryResult<Vec<AccountTransaction>> {
        account_transactions::table
            .filter(account_transactions::account_no.eq(account_no))
            .order(account_transactions::id.asc())
            .load(&self.connection)
    }

    /// Value-date range lookup, inclusive on both ends.
    pub fn transactions_in_range(
        &self,
        account_no: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> QueryResult<Vec<AccountTransaction>> {
        trace!(
            "Querying transactions for {} between {} and {}",
            account_no,
            start_date,
            end_date
        );
        account_transactions::table
            .filter(account_transactions::account_no.eq(account_no))
            .filter(account_transactions::value_date.between(start_date, end_date))
            .order(account_transactions::value_date.asc())
            .load(&self.connection)
    }

    pub fn transactions_by_type(
        &self,
        account_no: &str,
        tx_type: &str,
    ) -> QueryResult<Vec<AccountTransaction>> {
        account_transactions::table
            .filter(account_transactions::account_no.eq(account_no))
            .filter(account_transactions::tx_type.eq(tx_type))
            .order(account_transactions::id.asc())
            .load(&self.connection)
    }

    pub fn transactions_by_currency(&self, currency: &str) -> QueryResult<Vec<AccountTransaction>> {
        account_transactions::table
            .filter(account_transactions::currency.eq(currency))
            .order(account_transactions::id.asc())
            .load(&self.connection)
    }

    pub fn transaction_exists(&self, id: i64) -> QueryResult<bool> {
        select(exists(
            account_transactions::table.filter(account_transactions::id.eq(id)),
        ))
        .get_result(&self.connection)
    }

    /// Full-field overwrite of one transaction; nullable amounts are written
    /// back as NULL when absent.
    pub fn update_transaction(
        &self,
        id: i64,
        details: &NewAccountTransaction,
    ) -> QueryResult<AccountTransaction> {
        diesel::update(account_transactions::table.find(id))
            .set(details)
            .get_result(&self.connection)
    }

    pub fn delete_transaction(&self, id: i64) -> QueryResult<usize> {
        diesel::delete(account_transactions::table.find(id)).execute(&self.connection)
    }
}


#[cfg(test)]
mod transactions_test {
    use crate::{build_pool, DbConnection, DbPool};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use records::models::NewAccountTransaction;
    use std::str::FromStr;

    fn test_pool() -> DbPool {
        dotenv::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        build_pool(&url).expect("Failed connecting to DB")
    }

    fn sample_transaction(value_date: NaiveDate, tx_type: &str) -> NewAccountTransaction {
        let amount = Some(BigDecimal::from_str("9540.98").unwrap());
        let (debit_amt, credit_amt) = if tx_type == "Debit" {
            (amount, None)
        } else {
            (None, amount)
        };
        NewAccountTransaction {
            account_no: "585309209".to_string(),
            account_name: "SGSavings726".to_string(),
            value_date,
            currency: "SGD".to_string(),
            debit_amt,
            credit_amt,
            tx_type: tx_type.to_string(),
            tx_narrative: Some("ATM Deposit".to_string()),
        }
    }

    #[test]
    #[ignore]
    fn range_and_type_filters() {
        let pool = test_pool();
        let con = DbConnection::from_pool(&pool).unwrap();
        let inside = con
            .insert_transaction(&sample_transaction(
                NaiveDate::from_ymd_opt(2019, 1, 14).unwrap(),
                "Credit",
            ))
            .unwrap();
        let outside = con
            .insert_transaction(&sample_transaction(
                NaiveDate::from_ymd_opt(2019, 3, 1).unwrap(),
                "Debit",
            ))
            .unwrap();
        assert!(con.transaction_exists(inside.id).unwrap());

        let ranged = con
            .transactions_in_range(
                "585309209",
                NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2019, 1, 31).unwrap(),
            )
            .unwrap();
        assert!(ranged.iter().any(|t| t.id == inside.id));
        assert!(ranged.iter().all(|t| t.id != outside.id));

        let credits = con.transactions_by_type("585309209", "Credit").unwrap();
        assert!(credits.iter().all(|t| t.tx_type == "Credit"));

        con.delete_transaction(inside.id).unwrap();
        con.delete_transaction(outside.id).unwrap();
    }

    #[test]
    #[ignore]
    fn update_overwrites_nullable_amounts() {
        let pool = test_pool();
        let con = DbConnection::from_pool(&pool).unwrap();
        let created = con
            .insert_transaction(&sample_transaction(
                NaiveDate::from_ymd_opt(2019, 1, 14).unwrap(),
                "Credit",
            ))
            .unwrap();

        let replacement = sample_transaction(NaiveDate::from_ymd_opt(2019, 1, 15).unwrap(), "Debit");
        let updated = con.update_transaction(created.id, &replacement).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.tx_type, "Debit");
        assert!(updated.credit_amt.is_none());
        assert!(updated.debit_amt.is_some());

        assert_eq!(con.delete_transaction(created.id).unwrap(), 1);
        assert_eq!(con.delete_transaction(created.id).unwrap(), 0);
    }
}
