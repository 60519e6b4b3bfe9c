//! Instruction prompt for forensic enrichment.

use smartway_core::summary::AnalysisSummary;

/// Build the enrichment prompt for one summary.
///
/// The prompt embeds the serialized summary, lists the visual-forensics
/// criteria the model must check, and pins the three-key JSON output
/// contract decoded by [`crate::decode::decode_model_output`].
pub fn build_forensic_prompt(summary: &AnalysisSummary, has_snapshot: bool) -> String {
    let evidence = if has_snapshot {
        "Inspect the attached surveillance snapshot closely and base every \
         correction on what is visible in it."
    } else {
        "No snapshot is attached. Work from the detection data only and say so \
         in the Visual Evidence section."
    };
    let task_source = if has_snapshot {
        "the detection data and the surveillance snapshot"
    } else {
        "the detection data"
    };

    format!(
        r#"**Traffic Incident Forensic Review**

**Context**: Smart traffic management system. A roadside camera detector produced the per-video counts below.
**Detection data**: {data}

VISUAL FORENSICS CHECKLIST
{evidence}
1. **Fire / smoke**: a burning vehicle or thick smoke is a FIRE ACCIDENT.
2. **Severe deformity**: crushed, creased, or structurally broken vehicles.
3. **Unusual orientation**: vehicles upside down, on their side, or perpendicular to the lane (rollovers).
4. **Police / emergency vehicles**: light bars, sirens, or service liveries.

**Task**: Review {task_source} and write a detailed safety report.

**OUTPUT FORMAT (JSON ONLY)**
Return one JSON object with exactly these three keys:
1. "updated_data": an object with corrected counts and alerts backed by visual evidence. It is merged over the detection data.
   - Fire seen: {{ "ACCIDENT": 1, "alerts": ["Fire Accident Detected"] }}
   - Overturned vehicle: {{ "ACCIDENT": 1, "alerts": ["Rollover Accident Detected"] }}
   - Police vehicle seen: {{ "police": 1 }}
2. "html_report": an HTML report using <h3>, <ul>, <li>, <strong> with four sections:
   Infrastructure, Visual Evidence (fire, smoke, orientation), Accident Analysis, Recommendations.
3. "sms_summary": a plain-text digest of at most 160 characters,
   e.g. "FIRE ACCIDENT: Vehicle on fire at the junction. Emergency services required."

Do not wrap the answer in markdown code blocks. Return the raw JSON object only."#,
        data = summary.serialized(),
    )
}
