use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use time::{Date, macros::format_description};

/// Metadata fields a query is allowed to constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
	MeetingDate,
	MeetingDurationMinutes,
	Invitees,
	InviteesEmail,
	FathomUserName,
	FathomUserEmail,
}
impl FilterField {
	pub const ALL: [Self; 6] = [
		Self::MeetingDate,
		Self::MeetingDurationMinutes,
		Self::Invitees,
		Self::InviteesEmail,
		Self::FathomUserName,
		Self::FathomUserEmail,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::MeetingDate => "meeting_date",
			Self::MeetingDurationMinutes => "meeting_duration_minutes",
			Self::Invitees => "invitees",
			Self::InviteesEmail => "invitees_email",
			Self::FathomUserName => "fathom_user_name",
			Self::FathomUserEmail => "fathom_user_email",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|field| field.as_str() == raw)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ComparisonOp {
	#[serde(rename = "$gt")]
	Gt,
	#[serde(rename = "$lt")]
	Lt,
	#[serde(rename = "$eq")]
	Eq,
}
impl ComparisonOp {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Gt => "$gt",
			Self::Lt => "$lt",
			Self::Eq => "$eq",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		[Self::Gt, Self::Lt, Self::Eq].into_iter().find(|op| op.as_str() == raw)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Condition {
	Literal(Value),
	Compare(BTreeMap<ComparisonOp, Value>),
}

/// Structured metadata constraint. An empty filter means "no constraint" and is never sent to
/// the vector index; callers go through [`Filter::non_empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter {
	conditions: BTreeMap<FilterField, Condition>,
}
impl Filter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, field: FilterField, condition: Condition) -> Self {
		self.conditions.insert(field, condition);

		self
	}

	pub fn get(&self, field: FilterField) -> Option<&Condition> {
		self.conditions.get(&field)
	}

	pub fn len(&self) -> usize {
		self.conditions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn non_empty(&self) -> Option<&Self> {
		if self.is_empty() { None } else { Some(self) }
	}

	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
	}

	/// Builds a filter from untrusted JSON, keeping only whitelisted fields with well-formed
	/// values. Returns the filter and the keys that were dropped.
	pub fn sanitize(raw: &Value) -> (Self, Vec<String>) {
		let mut filter = Self::new();
		let mut dropped = Vec::new();
		let Some(object) = raw.as_object() else {
			return (filter, dropped);
		};

		for (key, value) in object {
			let condition = FilterField::parse(key).and_then(|field| {
				sanitize_condition(field, value).map(|condition| (field, condition))
			});

			match condition {
				Some((field, condition)) => {
					filter.conditions.insert(field, condition);
				},
				None => dropped.push(key.clone()),
			}
		}

		(filter, dropped)
	}
}

fn sanitize_condition(field: FilterField, value: &Value) -> Option<Condition> {
	match value {
		Value::Object(ops) => {
			let mut compare = BTreeMap::new();

			for (raw_op, operand) in ops {
				let op = ComparisonOp::parse(raw_op)?;

				compare.insert(op, sanitize_scalar(field, operand)?);
			}

			if compare.is_empty() { None } else { Some(Condition::Compare(compare)) }
		},
		Value::Array(items) => {
			let items =
				items.iter().map(|item| sanitize_scalar(field, item)).collect::<Option<Vec<_>>>()?;

			if items.is_empty() { None } else { Some(Condition::Literal(Value::Array(items))) }
		},
		_ => sanitize_scalar(field, value).map(Condition::Literal),
	}
}

fn sanitize_scalar(field: FilterField, value: &Value) -> Option<Value> {
	match (field, value) {
		(_, Value::Null | Value::Array(_) | Value::Object(_)) => None,
		(FilterField::MeetingDate, Value::String(raw)) =>
			is_calendar_date(raw).then(|| Value::String(raw.trim().to_string())),
		(FilterField::MeetingDate, _) => None,
		(FilterField::MeetingDurationMinutes, Value::Number(_)) => Some(value.clone()),
		(FilterField::MeetingDurationMinutes, Value::String(raw)) => raw
			.trim()
			.parse::<i64>()
			.ok()
			.map(|minutes| Value::Number(Number::from(minutes))),
		(FilterField::MeetingDurationMinutes, _) => None,
		(_, Value::String(raw)) if raw.trim().is_empty() => None,
		_ => Some(value.clone()),
	}
}

fn is_calendar_date(raw: &str) -> bool {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drops_unknown_fields_and_operators() {
		let raw = serde_json::json!({
			"meeting_date": "2024-03-05",
			"speaker": "Alice",
			"meeting_duration_minutes": { "$gt": 30, "$regex": "x" },
			"fathom_user_name": null,
		});
		let (filter, mut dropped) = Filter::sanitize(&raw);

		dropped.sort();

		assert_eq!(filter.len(), 1);
		assert_eq!(dropped, vec!["fathom_user_name", "meeting_duration_minutes", "speaker"]);
	}

	#[test]
	fn coerces_numeric_duration_strings() {
		let raw = serde_json::json!({ "meeting_duration_minutes": { "$lt": "45" } });
		let (filter, dropped) = Filter::sanitize(&raw);

		assert!(dropped.is_empty());
		assert_eq!(filter.to_value(), serde_json::json!({ "meeting_duration_minutes": { "$lt": 45 } }));
	}

	#[test]
	fn rejects_non_calendar_dates() {
		let raw = serde_json::json!({ "meeting_date": "2024-02-30" });
		let (filter, dropped) = Filter::sanitize(&raw);

		assert!(filter.is_empty());
		assert_eq!(dropped, vec!["meeting_date"]);
	}
}
