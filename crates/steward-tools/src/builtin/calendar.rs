use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde_json::{json, Value};

use super::google::GoogleApi;
use crate::tool::{optional_str, required_str, Tool, ToolContext};

const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_MAX_RESULTS: u64 = 10;
const MAX_RESULTS_LIMIT: u64 = 50;

fn events_url(base: &str, calendar_id: &str, event_id: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| anyhow::anyhow!("bad calendar url: {}", e))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("failed to build calendar url path"))?;
        segments.pop_if_empty();
        segments.push("calendars");
        segments.push(calendar_id);
        segments.push("events");
        if let Some(event_id) = event_id {
            segments.push(event_id);
        }
    }
    Ok(url)
}

fn calendar_id(args: &Value) -> &str {
    optional_str(args, "calendar_id").unwrap_or(DEFAULT_CALENDAR_ID)
}

fn summarize_event(event: &Value) -> Value {
    json!({
        "id": event.get("id"),
        "summary": event.get("summary"),
        "start": event.get("start"),
        "end": event.get("end"),
        "location": event.get("location"),
        "description": event.get("description"),
        "link": event.get("htmlLink"),
    })
}

pub struct ListEventsTool {
    api: Arc<GoogleApi>,
}

impl ListEventsTool {
    pub fn new(api: Arc<GoogleApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn name(&self) -> &str {
        "list_events"
    }

    fn description(&self) -> &str {
        "List upcoming events from a Google Calendar within an optional time range"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "calendar_id": {"type": "string", "description": "ID of the calendar to list events from", "default": "primary"},
                "max_results": {"type": "integer", "description": "Maximum number of events to list", "default": DEFAULT_MAX_RESULTS},
                "start_time": {"type": "string", "description": "Start time in ISO 8601 format, defaults to now"},
                "end_time": {"type": "string", "description": "End time in ISO 8601 format"},
                "timezone": {"type": "string", "description": "Timezone for the events", "default": "UTC"}
            }
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<String> {
        let max_results = args
            .get("max_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_RESULTS_LIMIT);
        let start = optional_str(&args, "start_time")
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        let mut url = events_url(&self.api.calendar_base, calendar_id(&args), None)?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("singleEvents", "true");
            qp.append_pair("orderBy", "startTime");
            qp.append_pair("maxResults", &max_results.to_string());
            qp.append_pair("timeMin", &start);
            if let Some(end) = optional_str(&args, "end_time") {
                qp.append_pair("timeMax", end);
            }
            qp.append_pair("timeZone", optional_str(&args, "timezone").unwrap_or("UTC"));
        }

        let body = match self.api.send(self.api.get(url.to_string())).await {
            Ok(body) => body,
            Err(failure) => return Ok(failure.into_payload()),
        };

        let events: Vec<Value> = body
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(summarize_event).collect())
            .unwrap_or_default();

        if events.is_empty() {
            return Ok("No events found in that time span.".to_string());
        }
        Ok(serde_json::to_string_pretty(&events)?)
    }
}

pub struct AddCalendarEventTool {
    api: Arc<GoogleApi>,
}

impl AddCalendarEventTool {
    pub fn new(api: Arc<GoogleApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for AddCalendarEventTool {
    fn name(&self) -> &str {
        "add_calendar_event"
    }

    fn description(&self) -> &str {
        "Add an event to Google Calendar"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "calendar_id": {"type": "string", "default": "primary"},
                "event_summary": {"type": "string", "description": "Summary of the event"},
                "event_location": {"type": "string", "description": "Location of the event"},
                "event_description": {"type": "string", "description": "Description of the event"},
                "start_time": {"type": "string", "description": "Start time of the event in ISO 8601 format"},
                "end_time": {"type": "string", "description": "End time of the event in ISO 8601 format"},
                "start_time_zone": {"type": "string", "description": "Time zone of the start time"},
                "end_time_zone": {"type": "string", "description": "Time zone of the end time"}
            },
            "required": ["event_summary", "start_time", "end_time"]
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<String> {
        let start_tz = optional_str(&args, "start_time_zone").unwrap_or("UTC");
        let event = json!({
            "summary": required_str(&args, "event_summary")?,
            "location": optional_str(&args, "event_location").unwrap_or_default(),
            "description": optional_str(&args, "event_description").unwrap_or_default(),
            "start": {"dateTime": required_str(&args, "start_time")?, "timeZone": start_tz},
            "end": {
                "dateTime": required_str(&args, "end_time")?,
                "timeZone": optional_str(&args, "end_time_zone").unwrap_or(start_tz)
            },
        });

        let url = events_url(&self.api.calendar_base, calendar_id(&args), None)?;
        match self.api.send(self.api.post(url.to_string()).json(&event)).await {
            Ok(created) => Ok(format!(
                "Event created: {}",
                created.get("htmlLink").and_then(Value::as_str).unwrap_or_default()
            )),
            Err(failure) => Ok(failure.into_payload()),
        }
    }
}

pub struct UpdateOrCancelEventTool {
    api: Arc<GoogleApi>,
}

impl UpdateOrCancelEventTool {
    pub fn new(api: Arc<GoogleApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for UpdateOrCancelEventTool {
    fn name(&self) -> &str {
        "update_or_cancel_event"
    }

    fn description(&self) -> &str {
        "Update or cancel an event in Google Calendar. Omit update_body to cancel."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "calendar_id": {"type": "string", "default": "primary"},
                "event_id": {"type": "string", "description": "ID of the event to update or cancel"},
                "update_body": {"type": "object", "description": "Full event resource to store"}
            },
            "required": ["event_id"]
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<String> {
        let event_id = required_str(&args, "event_id")?;
        let url = events_url(&self.api.calendar_base, calendar_id(&args), Some(event_id))?;

        match args.get("update_body").filter(|b| b.is_object()) {
            Some(body) => match self.api.send(self.api.put(url.to_string()).json(body)).await {
                Ok(updated) => Ok(format!(
                    "Event updated: {}",
                    updated.get("htmlLink").and_then(Value::as_str).unwrap_or_default()
                )),
                Err(failure) => Ok(failure.into_payload()),
            },
            None => match self.api.send(self.api.delete(url.to_string())).await {
                Ok(_) => Ok("Event deleted.".to_string()),
                Err(failure) => Ok(failure.into_payload()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_urls_escape_calendar_ids() {
        let url = events_url("https://example.test/calendar/v3", "me@example.com", Some("ev 1")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/calendar/v3/calendars/me@example.com/events/ev%201"
        );
    }
}
