//! Closed six-group client schema consumed by the prediction service.
//!
//! Every group is a struct whose fields are exactly the feature names the
//! model expects. The `record_group!` macro keeps the struct definition and
//! its [`FieldSpec`] table in one place so they cannot drift apart.

use crate::domain::model::FlatRow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION: &str = "1.0";

/// Placeholder used for text features the row did not supply.
pub const UNKNOWN_TEXT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Text,
}

impl FieldKind {
    pub fn default_value(self) -> Value {
        match self {
            FieldKind::Numeric => Value::from(0),
            FieldKind::Text => Value::String(UNKNOWN_TEXT.to_string()),
        }
    }
}

/// One schema feature: its canonical name, value kind and any raw column
/// names accepted in its place on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub aliases: &'static [&'static str],
}

impl FieldSpec {
    /// Canonical name first, then aliases in declaration order.
    pub fn source_keys(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

macro_rules! record_group {
    (
        $(#[$meta:meta])*
        $name:ident => $key:literal {
            $($field:ident : $kind:ident $([$($alias:literal),+])?),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(deny_unknown_fields)]
        pub struct $name {
            $(pub $field: Value,)+
        }

        impl $name {
            pub const KEY: &'static str = $key;

            pub const FIELDS: &'static [FieldSpec] = &[
                $(FieldSpec {
                    name: stringify!($field),
                    kind: FieldKind::$kind,
                    aliases: &[$($($alias),+)?],
                },)+
            ];

            /// Builds the group by asking `lookup` for every field in schema order.
            pub fn from_lookup(mut lookup: impl FnMut(&FieldSpec) -> Value) -> Self {
                Self {
                    $($field: lookup(&FieldSpec {
                        name: stringify!($field),
                        kind: FieldKind::$kind,
                        aliases: &[$($($alias),+)?],
                    }),)+
                }
            }

            pub fn entries(&self) -> Vec<(&'static str, &Value)> {
                vec![$((stringify!($field), &self.$field),)+]
            }
        }
    };
}

record_group! {
    Personal => "personal" {
        age: Numeric,
        gender: Text,
    }
}

record_group! {
    Financial => "financial" {
        turn_cur_cr_avg_act_v2: Numeric,
        diff_avg_cr_db_turn: Numeric,
        curr_rur_amt_cm_avg: Numeric,
        dda_rur_amt_curr_v2: Numeric,
        loanacc_rur_amt_cm_avg: Numeric,
        express_rur_amt_cm_avg: Numeric,
        total_rur_amt_cm_avg: Numeric,
        profit_income_out_rur_amt_12m: Numeric,
        profit_income_out_rur_amt_l2m: Numeric,
    }
}

record_group! {
    /// Credit bureau aggregates.
    Credit => "credit" {
        hdb_bki_total_max_limit: Numeric,
        hdb_bki_total_pil_max_limit: Numeric,
        hdb_outstand_sum: Numeric,
        hdb_ovrd_sum: Numeric,
        hdb_bki_total_products: Numeric,
        hdb_bki_total_pil_cnt: Numeric,
        hdb_bki_total_ip_cnt: Numeric,
        hdb_bki_total_max_overdue_sum: Numeric,
        hdb_bki_total_pil_max_overdue: Numeric,
        hdb_bki_total_pil_max_del90: Numeric,
        hdb_bki_active_cc_max_limit: Numeric,
        hdb_bki_active_pil_cnt: Numeric,
    }
}

record_group! {
    /// Card spending. Two features arrive under long raw column names in
    /// bank exports, so those names are accepted as aliases.
    Spending => "spending" {
        avg_by_category_supermarket_sum: Numeric
            ["avg_by_category__amount__sum__cashflowcategory_name__supermarkety"],
        avg_6m_restaurants: Numeric,
        avg_6m_travel: Numeric,
        transaction_category_supermarket_percent_cnt_2m: Numeric,
        by_category_transfer_by_phone_sum: Numeric
            ["by_category__amount__sum__eoperation_type_name__perevod_po_nomeru_telefona"],
    }
}

record_group! {
    Employment => "employment" {
        dp_ils_avg_salary_1y: Numeric,
        dp_ils_paymentssum_avg_12m: Numeric,
        dp_ewb_last_employment_position: Text,
        dp_ils_total_seniority: Numeric,
        dp_ils_uniq_companies_1y: Numeric,
        dp_ils_days_from_last_doc: Numeric,
        dp_ils_cnt_changes_1y: Numeric,
    }
}

record_group! {
    Additional => "additional" {
        per_capita_income_rur_amt: Numeric,
        label_Above_1M_share_r1: Numeric,
        salary_median_in_gex_r1: Numeric,
        blacklist_flag: Numeric,
        nonresident_flag: Numeric,
        client_active_flag: Numeric,
        accountsalary_out_flag: Numeric,
        first_salary_income: Numeric,
    }
}

/// A client record in the nested shape the prediction API accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredRecord {
    pub personal: Personal,
    pub financial: Financial,
    pub credit: Credit,
    pub spending: Spending,
    pub employment: Employment,
    pub additional: Additional,
}

impl StructuredRecord {
    pub fn from_lookup(mut lookup: impl FnMut(&FieldSpec) -> Value) -> Self {
        Self {
            personal: Personal::from_lookup(&mut lookup),
            financial: Financial::from_lookup(&mut lookup),
            credit: Credit::from_lookup(&mut lookup),
            spending: Spending::from_lookup(&mut lookup),
            employment: Employment::from_lookup(&mut lookup),
            additional: Additional::from_lookup(&mut lookup),
        }
    }

    /// Group key paired with that group's `(field, value)` entries.
    pub fn groups(&self) -> [(&'static str, Vec<(&'static str, &Value)>); 6] {
        [
            (Personal::KEY, self.personal.entries()),
            (Financial::KEY, self.financial.entries()),
            (Credit::KEY, self.credit.entries()),
            (Spending::KEY, self.spending.entries()),
            (Employment::KEY, self.employment.entries()),
            (Additional::KEY, self.additional.entries()),
        ]
    }

    /// All fields of all groups in one level, cloned.
    pub fn to_flat(&self) -> FlatRow {
        self.groups()
            .into_iter()
            .flat_map(|(_, entries)| entries)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

pub fn groups() -> [(&'static str, &'static [FieldSpec]); 6] {
    [
        (Personal::KEY, Personal::FIELDS),
        (Financial::KEY, Financial::FIELDS),
        (Credit::KEY, Credit::FIELDS),
        (Spending::KEY, Spending::FIELDS),
        (Employment::KEY, Employment::FIELDS),
        (Additional::KEY, Additional::FIELDS),
    ]
}

pub fn group_names() -> [&'static str; 6] {
    groups().map(|(key, _)| key)
}

pub fn is_group_name(key: &str) -> bool {
    group_names().contains(&key)
}

/// Every canonical feature name, in schema order.
pub fn field_names() -> Vec<&'static str> {
    groups()
        .iter()
        .flat_map(|(_, fields)| fields.iter().map(|spec| spec.name))
        .collect()
}
