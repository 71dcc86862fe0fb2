//! Synthetic NetCDF/HDF5 container generators.
//!
//! Tests build small containers on disk with the same libraries the
//! parsers read them with, so fixtures never depend on binary blobs
//! checked into the repository.

use std::path::Path;

/// Write a gridded NetCDF file with `lat`/`lon` coordinate variables and
/// one value variable spanning `leading_dims + [lat, lon]`.
///
/// `values` is row-major over the full variable shape, so for
/// `leading_dims = [("time", 1)]` it must hold
/// `1 * lats.len() * lons.len()` elements.
pub fn write_grid_netcdf(
    path: &Path,
    lat_name: &str,
    lon_name: &str,
    value_name: &str,
    lats: &[f64],
    lons: &[f64],
    leading_dims: &[(&str, usize)],
    values: &[f64],
) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension(lat_name, lats.len())?;
    file.add_dimension(lon_name, lons.len())?;
    for (name, len) in leading_dims {
        file.add_dimension(name, *len)?;
    }

    let mut lat_var = file.add_variable::<f64>(lat_name, &[lat_name])?;
    lat_var.put_values(lats, ..)?;
    let mut lon_var = file.add_variable::<f64>(lon_name, &[lon_name])?;
    lon_var.put_values(lons, ..)?;

    let mut dims: Vec<&str> = leading_dims.iter().map(|(name, _)| *name).collect();
    dims.push(lat_name);
    dims.push(lon_name);
    let mut value_var = file.add_variable::<f64>(value_name, &dims)?;
    value_var.put_values(values, ..)?;

    Ok(())
}

/// Write a point-based NetCDF file: equal-length 1-D lat/lon/value
/// variables over a shared observation dimension.
pub fn write_point_netcdf(
    path: &Path,
    value_name: &str,
    lats: &[f64],
    lons: &[f64],
    values: &[f64],
) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("obs", lats.len())?;

    let mut lat_var = file.add_variable::<f64>("lat", &["obs"])?;
    lat_var.put_values(lats, ..)?;
    let mut lon_var = file.add_variable::<f64>("lon", &["obs"])?;
    lon_var.put_values(lons, ..)?;
    let mut value_var = file.add_variable::<f64>(value_name, &["obs"])?;
    value_var.put_values(values, ..)?;

    Ok(())
}

/// Write a NetCDF file with no variable matching any latitude pattern.
pub fn write_netcdf_without_coordinates(path: &Path) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("row", 2)?;
    file.add_dimension("col", 2)?;
    let mut var = file.add_variable::<f64>("measurement", &["row", "col"])?;
    var.put_values(&[1.0, 2.0, 3.0, 4.0], ..)?;
    Ok(())
}

/// Write an HDF5 file with lat/lon/value datasets, optionally nested
/// under a group (e.g. `"data"` or `"geophysical_data"`).
pub fn write_hdf5_datasets(
    path: &Path,
    group: Option<&str>,
    lat_name: &str,
    lon_name: &str,
    value_name: &str,
    lats: &[f64],
    lons: &[f64],
    values: &[f64],
) -> Result<(), hdf5::Error> {
    let file = hdf5::File::create(path)?;
    let container: hdf5::Group = match group {
        Some(name) => file.create_group(name)?,
        None => file.group("/")?,
    };

    container
        .new_dataset_builder()
        .with_data(lats)
        .create(lat_name)?;
    container
        .new_dataset_builder()
        .with_data(lons)
        .create(lon_name)?;
    container
        .new_dataset_builder()
        .with_data(values)
        .create(value_name)?;

    Ok(())
}
