use crate::trackers::vehicle::Detection;
use crate::utils::bbox::WarpedBox;
use crate::Errors;
use serde::Deserialize;

/// Result of a recognition engine call
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineResult {
    pub ok: bool,
    /// Diagnostic message
    pub phrase: String,
    /// Recognition payload, JSON
    pub json: Option<String>,
}

impl EngineResult {
    pub fn success(json: impl Into<String>) -> Self {
        Self {
            ok: true,
            phrase: "OK".to_string(),
            json: Some(json.into()),
        }
    }

    pub fn failure(phrase: impl Into<String>) -> Self {
        Self {
            ok: false,
            phrase: phrase.into(),
            json: None,
        }
    }
}

#[derive(Deserialize)]
struct EnginePayload {
    frame_id: Option<u64>,
    #[serde(default)]
    plates: Vec<EnginePlate>,
}

#[derive(Deserialize)]
struct EnginePlate {
    text: String,
    #[serde(rename = "warpedBox")]
    warped_box: WarpedBox,
    car: Option<EngineCar>,
}

#[derive(Deserialize)]
struct EngineCar {
    #[serde(rename = "warpedBox")]
    warped_box: WarpedBox,
}

/// Detections of a frame, in the order reported by the engine
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineFrame {
    pub frame: u64,
    pub detections: Vec<Detection>,
}

/// Translates the engine result to detections.
///
/// # Parameters
/// * `result` - engine result
/// * `fallback_frame` - the frame number used when the payload carries no `frame_id`
///
/// Plates without an associated vehicle are not tracked and are dropped.
///
pub fn adapt(result: &EngineResult, fallback_frame: u64) -> Result<EngineFrame, Errors> {
    if !result.ok {
        return Err(Errors::EngineFailure(result.phrase.clone()));
    }
    let payload = match &result.json {
        None => {
            return Ok(EngineFrame {
                frame: fallback_frame,
                detections: vec![],
            })
        }
        Some(json) => serde_json::from_str::<EnginePayload>(json)
            .map_err(|e| Errors::MalformedEngineResult(e.to_string()))?,
    };

    let frame = payload.frame_id.unwrap_or(fallback_frame);
    let detections = payload
        .plates
        .into_iter()
        .filter_map(|p| {
            p.car
                .map(|car| Detection::new(p.text, p.warped_box, car.warped_box, frame))
        })
        .collect();

    Ok(EngineFrame { frame, detections })
}

#[cfg(test)]
mod tests {
    use crate::adapter::{adapt, EngineResult};
    use crate::test_stuff::{detection, engine_payload};
    use crate::Errors;

    #[test]
    fn detections() {
        let ds = vec![
            detection("ABC123", 4, 100.0, 100.0),
            detection("XYZ789", 4, 800.0, 200.0),
        ];
        let res = adapt(&EngineResult::success(engine_payload(4, &ds)), 1).unwrap();
        assert_eq!(res.frame, 4);
        assert_eq!(res.detections, ds);
    }

    #[test]
    fn plate_without_car() {
        let json = r#"{
            "frame_id": 2,
            "plates": [
                {"text": "NOCAR1", "warpedBox": [0, 0, 10, 0, 10, 5, 0, 5]},
                {"text": "CAR001", "warpedBox": [0, 0, 10, 0, 10, 5, 0, 5],
                 "car": {"warpedBox": [0, 0, 100, 0, 100, 50, 0, 50]}}
            ]
        }"#;
        let res = adapt(&EngineResult::success(json), 1).unwrap();
        assert_eq!(res.detections.len(), 1);
        assert_eq!(res.detections[0].text, "CAR001");
        assert_eq!(res.detections[0].vehicle_box.coords()[4], 100.0);
        assert_eq!(res.detections[0].frame, 2);
    }

    #[test]
    fn no_plates() {
        let res = adapt(&EngineResult::success(r#"{"duration": 3}"#), 9).unwrap();
        assert_eq!(res.frame, 9);
        assert!(res.detections.is_empty());

        let res = adapt(
            &EngineResult {
                ok: true,
                phrase: "OK".into(),
                json: None,
            },
            3,
        )
        .unwrap();
        assert_eq!(res.frame, 3);
    }

    #[test]
    fn failures() {
        let res = adapt(&EngineResult::failure("license expired"), 1);
        assert!(matches!(res, Err(Errors::EngineFailure(p)) if p == "license expired"));

        let res = adapt(&EngineResult::success("{\"plates\": [{}]}"), 1);
        assert!(matches!(res, Err(Errors::MalformedEngineResult(_))));

        let res = adapt(&EngineResult::success("not a json"), 1);
        assert!(matches!(res, Err(Errors::MalformedEngineResult(_))));
    }
}
