//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cync", version, about = "Control Cync/GE smart lights from the command line")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Cync account email.
    #[arg(long, env = "CYNC_EMAIL", global = true)]
    pub email: String,

    /// Cync account password. Prompted for interactively if omitted.
    #[arg(long, env = "CYNC_PASSWORD", global = true)]
    pub password: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify credentials against the Cync cloud account.
    Login,
    /// Fetch and print the homes/devices/rooms discovered on the account.
    Discover,
    /// Open a live gateway session and print state changes until interrupted.
    Connect,
    /// List known devices.
    Devices,
    /// List known rooms.
    Rooms,
    /// Turn a device or room on, optionally setting color/brightness/temperature.
    On(OnArgs),
    /// Turn a device or room off.
    Off(TargetArgs),
    /// Set brightness (0-255).
    Brightness(BrightnessArgs),
    /// Set color temperature in mireds (200-500).
    ColorTemp(ColorTempArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Device id (as shown by `devices`) or room id (as shown by `rooms`).
    pub id: String,
    /// Treat `id` as a room id rather than a device id.
    #[arg(long)]
    pub room: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OnArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// RGB color as "r,g,b" (each 0-255).
    #[arg(long)]
    pub rgb: Option<String>,
    /// Brightness, 0-255.
    #[arg(long)]
    pub brightness: Option<u8>,
    /// Color temperature in mireds, 200-500.
    #[arg(long = "color-temp")]
    pub color_temp: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct BrightnessArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// 0-255.
    pub brightness: u8,
}

#[derive(Args, Debug, Clone)]
pub struct ColorTempArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Mireds, 200-500.
    pub mireds: u16,
}
