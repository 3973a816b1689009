mod list_parser;
mod maths_utils;
mod perf;
mod time_utils;

pub use list_parser::{parse_float_list, parse_string_list};
pub use time_utils::{
    TimeUtils, date_to_epoch_secs, epoch_secs_to_local_date, format_duration,
    how_many_seconds_ago, local_now_as_timestamp_ms, local_today, parse_date,
    parse_event_timestamp, shift_days,
};

pub(crate) use maths_utils::{f1_from, mean, safe_ratio};
