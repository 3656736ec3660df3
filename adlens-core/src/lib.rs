pub mod builder;
pub mod clause;
pub mod columns;
pub mod eval;
pub mod export;
pub mod filter;
pub mod reader;
pub mod record;
pub mod taxonomy;

pub use adlens_common::{AdLensError, Result};
pub use builder::{BuilderPhase, FilterBuilder, InputKind, ValueSlot};
pub use clause::{parse_clause, parse_clauses, ClauseError};
pub use columns::{column_by_name, sort_rows, Column, COLUMNS};
pub use eval::{apply, filter_records, matches, FilterOutcome};
pub use filter::{
    create_condition, describe, format_for_display, ConditionError, ConditionId, Conjunction,
    FilterCondition, FilterSet, FilterValue,
};
pub use reader::{load_source, parse_csv_str, read_csv_file};
pub use record::{AdCreative, CellValue, Field, FieldKind};
pub use taxonomy::{category, resolve_field, Category, FieldType, Operator, CATEGORIES};
