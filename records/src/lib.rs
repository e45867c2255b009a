#[macro_use]
extern crate diesel;
extern crate bigdecimal;
extern crate chrono;

pub mod models;
pub mod schema;

use crate::models::{Account, AccountTransaction};
use std::fmt;

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account Number:    {}\n\
             Account Name:      {}\n\
             Type:              {}\n\
             Opening Balance:   {} {}",
            self.account_no, self.account_name, self.account_type, self.opening_avail_bal, self.currency
        )
    }
}

impl fmt::Display for AccountTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = match (&self.debit_amt, &self.credit_amt) {
            (Some(debit), _) => format!("-{}", debit),
            (None, Some(credit)) => credit.to_string(),
            (None, None) => String::from("0"),
        };
        write!(
            f,
            "Account Number:    {}\n\
             Value Date:        {}\n\
             Type:              {}\n\
             Amount:            {} {}",
            self.account_no, self.value_date, self.tx_type, amount, self.currency
        )
    }
}
