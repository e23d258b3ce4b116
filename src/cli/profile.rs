use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::{
    bluetooth::Address,
    config::{
        profile::{ProfileConfig, ProfileStore},
        EmulatorConfig,
    },
    drivers::switch::spi::RgbColor,
};

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Section")]
    section: &'static str,
    #[tabled(rename = "Setting")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl SettingRow {
    fn new(section: &'static str, name: &'static str, value: impl ToString) -> Self {
        Self {
            section,
            name,
            value: value.to_string(),
        }
    }
}

fn color(color: &RgbColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn mask(mask: u32) -> String {
    format!("{mask:#08x}")
}

fn rows(profile: &ProfileConfig) -> Vec<SettingRow> {
    let general = &profile.general;
    let colours = &profile.colours;
    let misc = &profile.misc;
    vec![
        SettingRow::new("general", "enable_rumble", general.enable_rumble),
        SettingRow::new("general", "enable_motion", general.enable_motion),
        SettingRow::new("colours", "body", color(&colours.body)),
        SettingRow::new("colours", "buttons", color(&colours.buttons)),
        SettingRow::new("colours", "left_grip", color(&colours.left_grip)),
        SettingRow::new("colours", "right_grip", color(&colours.right_grip)),
        SettingRow::new("misc", "use_western_layout", misc.use_western_layout),
        SettingRow::new("misc", "sony_led_brightness", misc.sony_led_brightness),
        SettingRow::new(
            "misc",
            "dualshock_pollingrate_divisor",
            misc.dualshock_pollingrate_divisor,
        ),
        SettingRow::new("misc", "swap_dpad_lstick", misc.swap_dpad_lstick),
        SettingRow::new("misc", "invert_lstick_xaxis", misc.invert_lstick_xaxis),
        SettingRow::new("misc", "invert_lstick_yaxis", misc.invert_lstick_yaxis),
        SettingRow::new("misc", "invert_rstick_xaxis", misc.invert_rstick_xaxis),
        SettingRow::new("misc", "invert_rstick_yaxis", misc.invert_rstick_yaxis),
        SettingRow::new("misc", "lstick_deadzone", misc.lstick_deadzone),
        SettingRow::new("misc", "rstick_deadzone", misc.rstick_deadzone),
        SettingRow::new("misc", "disable_home_button", misc.disable_home_button),
        SettingRow::new("misc", "hold_enable_mask", mask(misc.hold_enable_mask)),
        SettingRow::new(
            "misc",
            "inversion_enable_mask",
            mask(misc.inversion_enable_mask),
        ),
        SettingRow::new("misc", "turbo_enable_mask", mask(misc.turbo_enable_mask)),
    ]
}

pub fn handle_profile(
    config: &EmulatorConfig,
    address: &Address,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let store = ProfileStore::new(config);
    let profile = store.get_config(address)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let mut table = Table::new(rows(&profile));
    table
        .with(Style::modern_rounded())
        .with(Panel::header(format!("Controller {address}")));
    println!("{table}");
    if !config.disable_custom_profiles {
        println!("Profile: {:?}", store.profile_path(address));
    }

    Ok(())
}
