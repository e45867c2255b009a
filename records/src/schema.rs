table! {
    accounts (id) {
        id -> Int8,
        account_no -> Varchar,
        account_name -> Varchar,
        account_type -> Varchar,
        balance_date -> Date,
        currency -> Varchar,
        opening_avail_bal -> Numeric,
    }
}

table! {
    account_transactions (id) {
        id -> Int8,
        account_no -> Varchar,
        account_name -> Varchar,
        value_date -> Date,
        currency -> Varchar,
        debit_amt -> Nullable<Numeric>,
        credit_amt -> Nullable<Numeric>,
        tx_type -> Varchar,
        tx_narrative -> Nullable<Varchar>,
    }
}

allow_tables_to_appear_in_same_query!(accounts, account_transactions,);
