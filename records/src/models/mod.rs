use super::schema::{account_transactions, accounts};
use serde::{Deserialize, Serialize};

/// A stored account view row. Ids are assigned by the database.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub account_no: String,
    pub account_name: String,
    pub account_type: String,
    pub balance_date: chrono::naive::NaiveDate,
    pub currency: String,
    pub opening_avail_bal: bigdecimal::BigDecimal,
}

/// Insert payload for an account; the id column is left to the database.
#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[table_name = "accounts"]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub account_no: String,
    pub account_name: String,
    pub account_type: String,
    pub balance_date: chrono::naive::NaiveDate,
    pub currency: String,
    pub opening_avail_bal: bigdecimal::BigDecimal,
}

/// Mutable account fields. The account number is deliberately absent so an
/// update can never reassign it.
#[derive(AsChangeset, Serialize, Deserialize, Debug, Clone)]
#[table_name = "accounts"]
#[serde(rename_all = "camelCase")]
pub struct AccountChanges {
    pub account_name: String,
    pub account_type: String,
    pub balance_date: chrono::naive::NaiveDate,
    pub currency: String,
    pub opening_avail_bal: bigdecimal::BigDecimal,
}

/// A stored transaction row. The account number is not a foreign key, so a
/// transaction may refer to an account that no longer exists.
#[derive(Queryable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransaction {
    pub id: i64,
    pub account_no: String,
    pub account_name: String,
    pub value_date: chrono::naive::NaiveDate,
    pub currency: String,
    pub debit_amt: Option<bigdecimal::BigDecimal>,
    pub credit_amt: Option<bigdecimal::BigDecimal>,
    pub tx_type: String,
    pub tx_narrative: Option<String>,
}

/// Insert and full-overwrite payload for a transaction. Updates replace
/// every mutable column, so a missing debit/credit amount clears the column.
#[derive(Insertable, AsChangeset, Serialize, Deserialize, Debug, Clone)]
#[table_name = "account_transactions"]
#[changeset_options(treat_none_as_null = "true")]
#[serde(rename_all = "camelCase")]
pub struct NewAccountTransaction {
    pub account_no: String,
    pub account_name: String,
    pub value_date: chrono::naive::NaiveDate,
    pub currency: String,
    pub debit_amt: Option<bigdecimal::BigDecimal>,
    pub credit_amt: Option<bigdecimal::BigDecimal>,
    pub tx_type: String,
    pub tx_narrative: Option<String>,
}

fn required(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

impl NewAccount {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.account_no, "account number")?;
        required(&self.account_name, "account name")?;
        required(&self.account_type, "account type")?;
        required(&self.currency, "currency")?;
        Ok(())
    }
}

impl AccountChanges {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.account_name, "account name")?;
        required(&self.account_type, "account type")?;
        required(&self.currency, "currency")?;
        Ok(())
    }
}

impl NewAccountTransaction {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.account_no, "account number")?;
        required(&self.account_name, "account name")?;
        required(&self.tx_type, "transaction type")?;
        required(&self.currency, "currency")?;
        Ok(())
    }
}
