use crate::wells::{format_reading, SensorRecord};

const PERSONA: &str =
    "You are an expert SCADA engineer. Analyze this data and give 3 sections:";

// Length hints are advisory; nothing checks the response against them.
const RESPONSE_SECTIONS: &str = "\
Respond with:
1. **Fault Diagnosis (5–10 lines)**
2. **Required Action (5–10 lines)**
3. **Conclusion (2–5 lines)**";

/// Render the diagnosis prompt for one well.
pub fn build_prompt(record: &SensorRecord) -> String {
    format!(
        "\n{PERSONA}\n\n\
         WELL INFORMATION:\n\
         - Well ID: {}\n\
         - Temperature: {}°F\n\
         - Pressure: {} PSI\n\
         - Flow Rate: {} barrels/day\n\
         - Vibration: {} Hz\n\
         - Humidity: {}%\n\
         - Fault Detected: {}\n\
         - Suggested Action: {}\n\n\
         {RESPONSE_SECTIONS}\n",
        record.well_id,
        format_reading(record.temperature),
        format_reading(record.pressure),
        format_reading(record.flow_rate),
        format_reading(record.vibration),
        format_reading(record.humidity),
        record.fault_detected,
        record.suggested_action,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wells::dataset::tests::sample_record;

    #[test]
    fn prompt_lists_every_field_with_units() {
        let prompt = build_prompt(&sample_record());
        assert!(prompt.contains("- Well ID: well 2\n"));
        assert!(prompt.contains("- Temperature: 210.0°F\n"));
        assert!(prompt.contains("- Pressure: 3100.5 PSI\n"));
        assert!(prompt.contains("- Flow Rate: 950.0 barrels/day\n"));
        assert!(prompt.contains("- Vibration: 7.8 Hz\n"));
        assert!(prompt.contains("- Humidity: 60.0%\n"));
        assert!(prompt.contains("- Fault Detected: Yes\n"));
        assert!(prompt.contains("- Suggested Action: Check pump bearings\n"));
    }

    #[test]
    fn missing_reading_is_rendered_as_nan() {
        let mut record = sample_record();
        record.humidity = f64::NAN;
        assert!(build_prompt(&record).contains("- Humidity: nan%\n"));
    }

    #[test]
    fn prompt_requests_three_sections_in_order() {
        let prompt = build_prompt(&sample_record());
        let diagnosis = prompt.find("Fault Diagnosis (5–10 lines)").unwrap();
        let action = prompt.find("Required Action (5–10 lines)").unwrap();
        let conclusion = prompt.find("Conclusion (2–5 lines)").unwrap();
        assert!(diagnosis < action && action < conclusion);
        assert!(prompt.contains("expert SCADA engineer"));
    }
}
