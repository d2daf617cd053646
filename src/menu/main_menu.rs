use crate::config::{Preset, UserSettings, save_settings};
use crate::menu::handlers::{
    run_batch_process, run_custom_thumbnail, run_generate_thumbnail, run_quick_preview,
    run_video_info,
};
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const ESC_HINT: &str = "按 ESC 返回";

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    settings: &mut UserSettings,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 動態縮圖產生器 ===").cyan().bold());
    println!("{}", style(ESC_HINT).dim());

    let options = [
        "產生動態縮圖",
        "自訂參數產生動態縮圖",
        "快速預覽",
        "批次處理資料夾",
        "顯示影片資訊",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_generate_thumbnail(term, shutdown_signal, settings)?;
            Ok(true)
        }
        Some(1) => {
            run_custom_thumbnail(term, shutdown_signal, settings)?;
            Ok(true)
        }
        Some(2) => {
            run_quick_preview(term, shutdown_signal, settings)?;
            Ok(true)
        }
        Some(3) => {
            run_batch_process(term, shutdown_signal, settings)?;
            Ok(true)
        }
        Some(4) => {
            run_video_info(term, shutdown_signal, settings)?;
            Ok(true)
        }
        Some(5) => {
            show_settings_menu(term, settings)?;
            Ok(true)
        }
        Some(6) | None => Ok(false),
        _ => unreachable!(),
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "開啟" } else { "關閉" }
}

/// 設定選單，每次修改立即寫入 settings.json
fn show_settings_menu(term: &Term, settings: &mut UserSettings) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style("=== 設定 ===").cyan().bold());
        println!("{}", style(ESC_HINT).dim());

        let workers = settings
            .max_workers
            .map_or_else(|| "自動".to_string(), |n| n.to_string());
        let options = vec![
            format!("預設組合: {}", settings.preset),
            format!("加上影片資訊列: {}", on_off(settings.include_metadata)),
            format!("平行處理: {}", on_off(settings.enable_parallel)),
            format!("worker 數量: {workers}"),
            format!("壓縮輸出: {}", on_off(settings.compress_output)),
            format!("壓縮後保留未壓縮檔: {}", on_off(settings.keep_uncompressed)),
            format!("批次處理錯誤後繼續: {}", on_off(settings.continue_on_error)),
            "清除最近使用的路徑".to_string(),
            "返回".to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("選擇要修改的項目")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => {
                let Some(preset) = select_preset(term, settings.preset)? else {
                    continue;
                };
                settings.preset = preset;
            }
            Some(1) => settings.include_metadata = !settings.include_metadata,
            Some(2) => settings.enable_parallel = !settings.enable_parallel,
            Some(3) => settings.max_workers = prompt_max_workers(settings.max_workers)?,
            Some(4) => settings.compress_output = !settings.compress_output,
            Some(5) => settings.keep_uncompressed = !settings.keep_uncompressed,
            Some(6) => settings.continue_on_error = !settings.continue_on_error,
            Some(7) => settings.recent_paths.clear(),
            Some(8) | None => break,
            _ => unreachable!(),
        }

        save_settings(settings)?;
        println!("\n{}", style("設定已儲存").green());
        std::thread::sleep(std::time::Duration::from_millis(600));
    }

    Ok(())
}

fn select_preset(term: &Term, current: Preset) -> Result<Option<Preset>> {
    let items: Vec<String> = Preset::ALL.iter().map(ToString::to_string).collect();
    let default_index = Preset::ALL
        .iter()
        .position(|&p| p == current)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("選擇預設組合")
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    Ok(selection.map(|i| Preset::ALL[i]))
}

/// 0 代表自動（依 CPU 核心數）
fn prompt_max_workers(current: Option<usize>) -> Result<Option<usize>> {
    let value: usize = Input::new()
        .with_prompt("worker 數量（0 = 自動）")
        .default(current.unwrap_or(0))
        .interact_text()?;

    Ok((value > 0).then_some(value))
}
