//! Audio input listing via cpal

use cpal::traits::{DeviceTrait, HostTrait};

use crate::application::ports::EnumerationError;
use crate::domain::devices::AudioInput;

/// List capture devices of the default host, default device first.
///
/// The device name doubles as its id: it is what ffmpeg's ALSA/Pulse
/// inputs accept.
pub async fn list_audio_inputs() -> Result<Vec<AudioInput>, EnumerationError> {
    // cpal device probing blocks on the sound server
    tokio::task::spawn_blocking(query_inputs)
        .await
        .map_err(|e| EnumerationError::QueryFailed(format!("Task join error: {}", e)))?
}

fn query_inputs() -> Result<Vec<AudioInput>, EnumerationError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| EnumerationError::QueryFailed(e.to_string()))?;

    let names = devices.filter_map(|d| d.name().ok()).collect();
    Ok(order_inputs(names, default_name.as_deref()))
}

/// Deduplicate names and move the default device to the front
fn order_inputs(names: Vec<String>, default_name: Option<&str>) -> Vec<AudioInput> {
    let mut inputs: Vec<AudioInput> = Vec::with_capacity(names.len());
    for name in names {
        if inputs.iter().any(|i| i.device_id == name) {
            continue;
        }
        inputs.push(AudioInput {
            label: name.clone(),
            device_id: name,
        });
    }

    if let Some(default_name) = default_name {
        if let Some(pos) = inputs.iter().position(|i| i.device_id == default_name) {
            let default = inputs.remove(pos);
            inputs.insert(0, default);
        }
    }

    inputs
}
