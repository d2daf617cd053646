use animated_thumbnail::config::load_settings;
use animated_thumbnail::init;
use animated_thumbnail::menu::show_main_menu;
use animated_thumbnail::signal::setup_shutdown_signal;
use anyhow::Result;
use console::{Term, style};
use log::{info, warn};

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut settings = load_settings().unwrap_or_else(|e| {
        warn!("無法讀取設定，使用預設值: {e:#}");
        Default::default()
    });

    loop {
        match show_main_menu(&term, &shutdown_signal, &mut settings) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("再見！").green().bold());
                info!("程式正常結束");
                break;
            }
            Err(e) => {
                warn!("程式錯誤: {e}");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
