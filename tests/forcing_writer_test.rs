use chrono::NaiveDate;
use ndarray::Array2;
use nemo_forcing::data_io::ForcingFileWriter;
use nemo_forcing::period::Advance;
use nemo_forcing::stream::{ForcingSink, ForcingStream};
use nemo_forcing::{Calendar, Chunking, ForcingConfig, PeriodTracker};
use tempfile::tempdir;

#[test]
fn test_written_file_round_trips() {
    let dir = tempdir().unwrap();
    let config = ForcingConfig {
        chunking: Chunking::Monthly,
        output_dir: dir.path().to_path_buf(),
        ..ForcingConfig::default()
    };
    let var = config.variable("tmp2m").unwrap().clone();

    let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Monthly, 6);
    let t = NaiveDate::from_ymd_opt(2014, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let Advance::Opened(period) = tracker.advance(t) else {
        panic!("expected a new period");
    };

    let lat = vec![20.0, 20.5];
    let lon = vec![-110.0, -109.5, -109.0];
    let mut writer = ForcingFileWriter::new(&config, lat.clone(), lon.clone());

    let field = Array2::from_shape_fn((2, 3), |(j, i)| (j * 3 + i) as f32);
    {
        let mut stream = writer.open(&var, &period, &period.regular_axis).unwrap();
        stream.write_at(field.view(), 2).unwrap();
        // Slots may be revisited; the last write must win.
        stream.write_at(field.view(), 2).unwrap();
    }

    let path = dir.path().join("drowned_t2_GFS_y2014_M01.nc");
    assert!(path.is_file(), "expected {} to exist", path.display());

    let file = netcdf::open(&path).unwrap();
    assert_eq!(file.dimension("lat").unwrap().len(), 2);
    assert_eq!(file.dimension("lon").unwrap().len(), 3);

    let time: Vec<f64> = file.variable("time").unwrap().get_values(..).unwrap();
    assert_eq!(time.len(), 31 * 4);
    assert_eq!(time, period.regular_axis);

    let lat_read: Vec<f64> = file.variable("lat").unwrap().get_values(..).unwrap();
    assert_eq!(lat_read, lat);
    let lon_read: Vec<f64> = file.variable("lon").unwrap().get_values(..).unwrap();
    assert_eq!(lon_read, lon);

    let t2 = file.variable("t2").unwrap();
    let slab: Vec<f32> = t2.get_values((2..3, .., ..)).unwrap();
    assert_eq!(slab, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_writer_rejects_wrong_grid_shape() {
    let dir = tempdir().unwrap();
    let config = ForcingConfig {
        output_dir: dir.path().to_path_buf(),
        ..ForcingConfig::default()
    };
    let var = config.variable("tmp2m").unwrap().clone();

    let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Yearly, 6);
    let t = NaiveDate::from_ymd_opt(2014, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let Advance::Opened(period) = tracker.advance(t) else {
        panic!("expected a new period");
    };

    let mut writer = ForcingFileWriter::new(&config, vec![0.0, 1.0], vec![0.0, 1.0]);
    let mut stream = writer.open(&var, &period, &period.regular_axis).unwrap();

    let wrong = Array2::<f32>::zeros((3, 2));
    assert!(stream.write_at(wrong.view(), 0).is_err());
}

#[test]
fn test_yearly_file_name_has_no_month_suffix() {
    let dir = tempdir().unwrap();
    let config = ForcingConfig {
        output_dir: dir.path().to_path_buf(),
        ..ForcingConfig::default()
    };
    let var = config.variable("ugrd10m").unwrap().clone();

    let mut tracker = PeriodTracker::new(Calendar::NoLeap, Chunking::Yearly, 6);
    let t = NaiveDate::from_ymd_opt(2015, 7, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let Advance::Opened(period) = tracker.advance(t) else {
        panic!("expected a new period");
    };

    let mut writer = ForcingFileWriter::new(&config, vec![0.0], vec![0.0]);
    let _stream = writer.open(&var, &period, &period.regular_axis).unwrap();
    assert!(dir.path().join("drowned_u10_GFS_y2015.nc").is_file());
}
