pub mod csv_schedule_adapter;
pub mod file_config_adapter;
pub mod nyse_calendar_adapter;
