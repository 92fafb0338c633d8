//! Text filters and the registry that builds them.

mod case_filters;
mod codec_filters;
mod filter_trait;
mod int_base_filter;
mod options;
mod process_filter;
mod regex_filter;
mod registry;
mod translate_filter;

pub use case_filters::{CamelCaseFilter, ReverseWordsFilter, SnakeCaseFilter};
pub use codec_filters::{Base64Filter, EscapeFilter, UrlEncodeFilter};
pub use filter_trait::TextFilter;
pub use int_base_filter::IntBaseFilter;
pub use options::{parse_key_value, FilterArgs};
pub use process_filter::ProcessFilter;
pub use regex_filter::RegexFilter;
pub use registry::{FilterContext, FilterRegistry};
pub use translate_filter::TranslateFilter;
