//! Column names and fixed cleaning rules for the loan dataset.

// Columns referenced individually by the cleaning rules
pub const MEMBER_ID: &str = "member_id";
pub const EMP_LENGTH: &str = "emp_length";
pub const TERM: &str = "term";
pub const ANNUAL_INC: &str = "annual_inc";
pub const VERIFICATION_STATUS: &str = "verification_status";
pub const DELINQ_2YRS: &str = "delinq_2yrs";
pub const INQ_LAST_6MTHS: &str = "inq_last_6mths";

/// Columns coerced to numbers, failures becoming zero.
/// `emp_length` is not listed: it carries text until the validation stage re-encodes it.
pub const NUMERIC_COLUMNS: [&str; 27] = [
    "loan_amnt",
    "funded_amnt",
    "funded_amnt_inv",
    "int_rate",
    "installment",
    ANNUAL_INC,
    "dti",
    DELINQ_2YRS,
    INQ_LAST_6MTHS,
    "mths_since_last_delinq",
    "mths_since_last_record",
    "open_acc",
    "pub_rec",
    "revol_bal",
    "revol_util",
    "total_acc",
    "out_prncp",
    "out_prncp_inv",
    "total_pymnt",
    "total_pymnt_inv",
    "total_rec_prncp",
    "total_rec_int",
    "total_rec_late_fee",
    "recoveries",
    "collection_recovery_fee",
    "last_pymnt_amnt",
    "policy_code",
];

pub const DATE_COLUMNS: [&str; 5] = [
    "issue_d",
    "earliest_cr_line",
    "last_credit_pull_d",
    "last_pymnt_d",
    "next_pymnt_d",
];

/// Source dates look like "Dec-2015"; the day is pinned to the 1st
pub const SOURCE_DATE_FORMAT: &str = "%b-%Y";
pub const DEFAULT_DAY_OF_MONTH: u32 = 1;

/// Literal token the validation stage turns into null everywhere
pub const NOT_AVAILABLE_TOKEN: &str = "n/a";

pub const EMP_LENGTH_TEN_PLUS: &str = "10+ years";
pub const EMP_LENGTH_UNDER_ONE: &str = "< 1 year";

pub const DEFAULT_VERIFICATION_STATUS: &str = "Not Verified";

/// Cell spellings read as null by the CSV loader. `n/a` is left as text for
/// the validation stage.
pub const CSV_NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "nan", "null",
];

pub fn is_csv_null_token(raw: &str) -> bool {
    CSV_NULL_TOKENS.contains(&raw)
}
