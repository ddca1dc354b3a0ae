use clap::Parser;
use std::path::PathBuf;

use rewarp::ResamplingMethod;

#[derive(Parser)]
#[command(name = "rewarp", version, about = "REWARP CLI")]
pub struct CliArgs {
    /// Input georeferenced raster (GeoTIFF)
    pub input: PathBuf,

    /// Output filename
    pub output: PathBuf,

    /// Source CRS override (e.g., EPSG:32611); read from the file otherwise
    #[arg(long)]
    pub src_crs: Option<String>,

    /// Destination CRS (e.g., EPSG:4326); defaults to the source CRS
    #[arg(long)]
    pub dst_crs: Option<String>,

    /// Output size as "width,height"; a 0 dimension is derived automatically
    #[arg(long)]
    pub size: Option<String>,

    /// Output extent as "xmin,ymin,xmax,ymax"
    #[arg(long)]
    pub bbox: Option<String>,

    /// CRS of --bbox; defaults to the destination CRS
    #[arg(long)]
    pub bbox_crs: Option<String>,

    /// Target resolution "xres[,yres]" in destination CRS units
    #[arg(long)]
    pub resolution: Option<String>,

    /// Resampling method
    #[arg(long, value_enum, default_value_t = ResamplingMethod::Nearest)]
    pub resampling: ResamplingMethod,

    /// Source no-data value override
    #[arg(long)]
    pub src_nodata: Option<f64>,

    /// Destination no-data value
    #[arg(long)]
    pub dst_nodata: Option<f64>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// JSON preset file with reprojection parameters; explicit flags win
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Also write world-file and .prj sidecars
    #[arg(long, default_value_t = false)]
    pub sidecars: bool,

    /// Suppress the progress line
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
