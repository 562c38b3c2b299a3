//! Built-in functions. Each receives its arguments already evaluated.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    collection::{Collection, ValueSet},
    evaluator::{EvalResult, expect_args},
    registry::Registry,
    value::{Value, ValueType},
};

const EARTH_RADIUS_METRES: f64 = 6_378_137.0;

fn boolean(b: bool) -> Collection {
    Collection::single(Value::Boolean(b), ValueType::Boolean)
}

fn number(n: f64) -> Collection {
    Collection::single(Value::Number(n), ValueType::Number)
}

/// JavaScript `Math.round`: halves round up.
fn js_round(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn numbers(args: &[Collection]) -> impl Iterator<Item = f64> + '_ {
    args.iter()
        .flat_map(|arg| arg.iter())
        .map(Value::to_number)
        .filter(|n| !n.is_nan())
}

fn last_value(arg: Option<&Collection>) -> Option<&Value> {
    arg.and_then(|collection| collection.iter().last())
}

fn union(args: &[Collection]) -> EvalResult<Collection> {
    let mut values = ValueSet::new();
    let mut value_type = None;
    for arg in args {
        if value_type.is_none() && arg.size() > 0 {
            value_type = Some(arg.value_type().clone());
        }
        for value in arg.iter() {
            values.add(value.clone());
        }
    }
    Ok(Collection::set(values, value_type.unwrap_or_default()))
}

fn contains(args: &[Collection]) -> EvalResult<Collection> {
    expect_args("contains", args, 2)?;
    let set = args[0].get_set();
    let result = !set.is_empty() && args[1].iter().all(|v| set.contains(v));
    Ok(boolean(result))
}

fn exists(args: &[Collection]) -> EvalResult<Collection> {
    expect_args("exists", args, 1)?;
    Ok(boolean(args[0].size() > 0))
}

fn count(args: &[Collection]) -> EvalResult<Collection> {
    expect_args("count", args, 1)?;
    Ok(number(args[0].size() as f64))
}

fn not(args: &[Collection]) -> EvalResult<Collection> {
    expect_args("not", args, 1)?;
    Ok(boolean(!args[0].contains(&Value::Boolean(true))))
}

fn add(args: &[Collection]) -> EvalResult<Collection> {
    Ok(number(numbers(args).sum()))
}

fn multiply(args: &[Collection]) -> EvalResult<Collection> {
    Ok(number(numbers(args).product()))
}

fn concat(args: &[Collection]) -> EvalResult<Collection> {
    let text: String = args.iter().flat_map(|arg| arg.iter()).map(|v| v.as_text()).collect();
    Ok(Collection::single(Value::Text(text), ValueType::Text))
}

fn min(args: &[Collection]) -> EvalResult<Collection> {
    Ok(match numbers(args).reduce(f64::min) {
        Some(n) => number(n),
        None => Collection::empty(ValueType::Number),
    })
}

fn max(args: &[Collection]) -> EvalResult<Collection> {
    Ok(match numbers(args).reduce(f64::max) {
        Some(n) => number(n),
        None => Collection::empty(ValueType::Number),
    })
}

/// Milliseconds since the epoch of an ISO-8601 date or date-time, or of a
/// bare `YYYY` / `YYYY-MM`. Values without a zone are taken as UTC.
pub(crate) fn parse_date_millis(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis() as f64);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            let year = text.parse::<i32>().ok().filter(|_| text.len() == 4)?;
            NaiveDate::from_ymd_opt(year, 1, 1)
        })?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64)
}

fn unit_millis(unit: &str) -> Option<f64> {
    const SECOND: f64 = 1000.0;
    const DAY: f64 = 86_400_000.0;
    Some(match unit {
        "second" => SECOND,
        "minute" => 60.0 * SECOND,
        "hour" => 3600.0 * SECOND,
        "day" => DAY,
        "week" => 7.0 * DAY,
        "month" => 30.0 * DAY,
        "quarter" => 90.0 * DAY,
        "year" => 365.0 * DAY,
        "decade" => 3650.0 * DAY,
        "century" => 36_500.0 * DAY,
        _ => return None,
    })
}

fn date_range(args: &[Collection]) -> EvalResult<Collection> {
    expect_args("date-range", args, 2)?;
    let parse = |v: &Value| parse_date_millis(&v.as_text());
    let from = args[0].iter().filter_map(parse).fold(f64::INFINITY, f64::min);
    let to = args[1].iter().filter_map(parse).fold(f64::NEG_INFINITY, f64::max);

    let range = to - from;
    if !range.is_finite() {
        return Ok(Collection::empty(ValueType::Number));
    }
    let unit = last_value(args.get(2)).map_or("day".into(), Value::as_text);
    let result = match unit_millis(&unit) {
        Some(factor) => js_round(range / factor),
        None => range,
    };
    Ok(number(result))
}

/// Great-circle distance in metres between two points in degrees.
fn haversine(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METRES * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Rounds `n` to a multiple of `precision`.
fn round_to(n: f64, precision: f64) -> Option<f64> {
    let precision = Decimal::from_f64(precision)?;
    if precision.is_zero() {
        return Some(n);
    }
    let steps = Decimal::from_f64(n)?
        .checked_div(precision)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    steps.checked_mul(precision)?.to_f64()
}

fn distance(args: &[Collection]) -> EvalResult<Collection> {
    expect_args("distance", args, 3)?;
    let empty = Collection::empty(ValueType::Number);

    let Some(origin) = last_value(args.first()) else {
        return Ok(empty);
    };
    let origin_text = origin.as_text();
    let Some((lat, lng)) = origin_text.split_once(',') else {
        return Ok(empty);
    };
    let (lat1, lng1) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>());
    let (Ok(lat1), Ok(lng1)) = (lat1, lng1) else {
        return Ok(empty);
    };
    let lat2 = last_value(args.get(1)).map_or(f64::NAN, Value::to_number);
    let lng2 = last_value(args.get(2)).map_or(f64::NAN, Value::to_number);
    if lat2.is_nan() || lng2.is_nan() {
        return Ok(empty);
    }

    let metres = haversine(lat1, lng1, lat2, lng2);
    let unit = last_value(args.get(3)).map(Value::as_text);
    let scaled = match unit.as_deref() {
        Some("km") => metres / 1e3,
        Some("mile") => metres / 1609.344,
        _ => metres,
    };
    let precision = last_value(args.get(4)).map_or(1.0, Value::to_number);
    Ok(match round_to(scaled, precision) {
        Some(n) => number(n),
        None => number(scaled),
    })
}

fn now(_args: &[Collection]) -> EvalResult<Collection> {
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    Ok(Collection::single(Value::Text(stamp), ValueType::Date))
}

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.replace_function("union", union);
    registry.replace_function("contains", contains);
    registry.replace_function("exists", exists);
    registry.replace_function("count", count);
    registry.replace_function("not", not);
    registry.replace_function("add", add);
    registry.replace_function("multiply", multiply);
    registry.replace_function("concat", concat);
    registry.replace_function("min", min);
    registry.replace_function("max", max);
    registry.replace_function("date-range", date_range);
    registry.replace_function("distance", distance);
    registry.replace_function("now", now);
}
