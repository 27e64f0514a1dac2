//! The `loan` table layout shared by the cleaning stages and storage.

use std::fmt;

/// Declared SQL type of a loan table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Date,
    Varchar(u16),
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::Float => f.write_str("REAL"),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Varchar(len) => write!(f, "VARCHAR({len})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name,
            column_type,
            nullable,
        }
    }
}

/// Ordered column list of a target table
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    columns: &'static [ColumnSpec],
}

impl TableSchema {
    pub const fn new(columns: &'static [ColumnSpec]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|c| c.name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Lending Club loan record as stored in the target table
pub const LOAN_SCHEMA: TableSchema = TableSchema::new(LOAN_COLUMNS);

const LOAN_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("id", ColumnType::Integer, false),
    ColumnSpec::new("member_id", ColumnType::Integer, false),
    ColumnSpec::new("loan_amnt", ColumnType::Float, false),
    ColumnSpec::new("funded_amnt", ColumnType::Float, false),
    ColumnSpec::new("funded_amnt_inv", ColumnType::Float, false),
    ColumnSpec::new("term", ColumnType::Integer, false),
    ColumnSpec::new("int_rate", ColumnType::Float, false),
    ColumnSpec::new("installment", ColumnType::Float, false),
    ColumnSpec::new("grade", ColumnType::Varchar(1), false),
    ColumnSpec::new("sub_grade", ColumnType::Varchar(2), false),
    ColumnSpec::new("emp_title", ColumnType::Varchar(100), true),
    ColumnSpec::new("emp_length", ColumnType::Integer, false),
    ColumnSpec::new("home_ownership", ColumnType::Varchar(50), false),
    ColumnSpec::new("annual_inc", ColumnType::Float, true),
    ColumnSpec::new("verification_status", ColumnType::Varchar(20), false),
    ColumnSpec::new("issue_d", ColumnType::Date, false),
    ColumnSpec::new("loan_status", ColumnType::Varchar(100), false),
    ColumnSpec::new("pymnt_plan", ColumnType::Varchar(1), false),
    ColumnSpec::new("url", ColumnType::Varchar(100), false),
    ColumnSpec::new("desc", ColumnType::Varchar(400), true),
    ColumnSpec::new("purpose", ColumnType::Varchar(100), false),
    ColumnSpec::new("title", ColumnType::Varchar(100), true),
    ColumnSpec::new("zip_code", ColumnType::Varchar(5), false),
    ColumnSpec::new("addr_state", ColumnType::Varchar(2), false),
    ColumnSpec::new("dti", ColumnType::Float, false),
    ColumnSpec::new("delinq_2yrs", ColumnType::Integer, false),
    ColumnSpec::new("earliest_cr_line", ColumnType::Date, true),
    ColumnSpec::new("inq_last_6mths", ColumnType::Integer, false),
    ColumnSpec::new("mths_since_last_delinq", ColumnType::Integer, true),
    ColumnSpec::new("mths_since_last_record", ColumnType::Integer, true),
    ColumnSpec::new("open_acc", ColumnType::Integer, true),
    ColumnSpec::new("pub_rec", ColumnType::Integer, true),
    ColumnSpec::new("revol_bal", ColumnType::Float, false),
    ColumnSpec::new("revol_util", ColumnType::Float, false),
    ColumnSpec::new("total_acc", ColumnType::Integer, false),
    ColumnSpec::new("initial_list_status", ColumnType::Varchar(1), false),
    ColumnSpec::new("out_prncp", ColumnType::Float, false),
    ColumnSpec::new("out_prncp_inv", ColumnType::Float, false),
    ColumnSpec::new("total_pymnt", ColumnType::Float, false),
    ColumnSpec::new("total_pymnt_inv", ColumnType::Float, false),
    ColumnSpec::new("total_rec_prncp", ColumnType::Float, false),
    ColumnSpec::new("total_rec_int", ColumnType::Float, false),
    ColumnSpec::new("total_rec_late_fee", ColumnType::Float, false),
    ColumnSpec::new("recoveries", ColumnType::Float, false),
    ColumnSpec::new("collection_recovery_fee", ColumnType::Float, false),
    ColumnSpec::new("last_pymnt_d", ColumnType::Date, true),
    ColumnSpec::new("last_pymnt_amnt", ColumnType::Float, false),
    ColumnSpec::new("next_pymnt_d", ColumnType::Date, true),
    ColumnSpec::new("last_credit_pull_d", ColumnType::Date, true),
    ColumnSpec::new("collections_12_mths_ex_med", ColumnType::Integer, true),
    ColumnSpec::new("mths_since_last_major_derog", ColumnType::Integer, true),
    ColumnSpec::new("policy_code", ColumnType::Integer, false),
    ColumnSpec::new("application_type", ColumnType::Varchar(20), false),
    ColumnSpec::new("annual_inc_joint", ColumnType::Float, true),
    ColumnSpec::new("dti_joint", ColumnType::Float, true),
    ColumnSpec::new("verification_status_joint", ColumnType::Varchar(20), true),
    ColumnSpec::new("acc_now_delinq", ColumnType::Integer, false),
    ColumnSpec::new("tot_coll_amt", ColumnType::Float, false),
    ColumnSpec::new("tot_cur_bal", ColumnType::Float, false),
    ColumnSpec::new("open_acc_6m", ColumnType::Integer, true),
    ColumnSpec::new("open_il_6m", ColumnType::Integer, true),
    ColumnSpec::new("open_il_12m", ColumnType::Integer, true),
    ColumnSpec::new("open_il_24m", ColumnType::Integer, true),
    ColumnSpec::new("mths_since_rcnt_il", ColumnType::Integer, true),
    ColumnSpec::new("total_bal_il", ColumnType::Float, true),
    ColumnSpec::new("il_util", ColumnType::Float, true),
    ColumnSpec::new("open_rv_12m", ColumnType::Integer, true),
    ColumnSpec::new("open_rv_24m", ColumnType::Integer, true),
    ColumnSpec::new("max_bal_bc", ColumnType::Float, true),
    ColumnSpec::new("all_util", ColumnType::Float, true),
    ColumnSpec::new("total_rev_hi_lim", ColumnType::Float, true),
    ColumnSpec::new("inq_fi", ColumnType::Integer, true),
    ColumnSpec::new("total_cu_tl", ColumnType::Integer, true),
    ColumnSpec::new("inq_last_12m", ColumnType::Integer, true),
];
