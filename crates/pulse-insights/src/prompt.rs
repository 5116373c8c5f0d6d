//! Prompt rendering and response parsing.

use pulse_analytics::InsightSummary;
use pulse_core::{Error, Result};

use crate::types::Insights;

const RESPONSE_SHAPE: &str = r#"{
  "summary": "A brief 2-3 sentence overview of the campus emissions situation",
  "categories": [
    {
      "type": "peak_hours",
      "title": "Peak Emission Periods",
      "items": [
        {
          "title": "Short title",
          "description": "Detailed explanation of when and why emissions peak",
          "value": "Specific metric or time"
        }
      ]
    },
    {
      "type": "buildings",
      "title": "Building Analysis",
      "items": [
        {
          "title": "Building name or pattern",
          "description": "Analysis of building emissions and patterns",
          "value": "Percentage or emission value"
        }
      ]
    },
    {
      "type": "trends",
      "title": "Emission Trends",
      "items": [
        {
          "title": "Trend name",
          "description": "Notable pattern across the day or between buildings",
          "value": "Relevant metric"
        }
      ]
    },
    {
      "type": "recommendations",
      "title": "Recommended Actions",
      "items": [
        {
          "title": "Action name",
          "description": "Detailed, actionable measure to reduce emissions (2-3 sentences)",
          "impact": "Estimated impact or benefit"
        }
      ]
    }
  ]
}"#;

const REQUIREMENTS: &str = "REQUIREMENTS:
- Provide 2-3 items for peak_hours, buildings, and trends
- Provide 4-6 detailed, actionable recommendations
- Be specific and reference the actual data
- Make descriptions informative but concise
- Focus on practical, implementable solutions for a university campus
- Return ONLY valid JSON, no markdown formatting or code blocks";

/// Render the insight prompt for a forecast summary.
pub fn build_prompt(summary: &InsightSummary) -> String {
    let top = summary
        .top_buildings
        .iter()
        .map(|b| format!("{} ({} kg)", b.name, b.total))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are analyzing carbon emissions data for a university campus with {count} buildings.\n\
         \n\
         DATA SUMMARY:\n\
         - Total Daily Emissions: {total} kg CO2e\n\
         - Average Hourly Emission: {avg} kg CO2e\n\
         - Peak Hour: {peak_hour}:00 with {peak} kg CO2e\n\
         - Top 3 Polluting Buildings: {top}\n\
         \n\
         TASK: Provide structured insights in JSON format with the following structure:\n\
         \n\
         {shape}\n\
         \n\
         {requirements}",
        count = summary.building_count,
        total = summary.total_emissions,
        avg = summary.average_emission,
        peak_hour = summary.peak_hour,
        peak = summary.peak_emission,
        top = top,
        shape = RESPONSE_SHAPE,
        requirements = REQUIREMENTS,
    )
}

/// Remove a surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parse generated text into insights.
pub fn parse_insights(text: &str) -> Result<Insights> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| {
        Error::InvalidUpstreamResponse(format!("Failed to parse AI response as JSON: {}", e))
    })
}
