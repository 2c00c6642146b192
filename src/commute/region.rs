use geo_types::Point;
use rand::Rng;

/// Latitude/longitude bounding box that homes are sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub lat: (f64, f64),
    pub lng: (f64, f64),
}

impl Region {
    pub fn new(name: &str, lat: (f64, f64), lng: (f64, f64)) -> Self {
        Self {
            name: name.to_owned(),
            lat,
            lng,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let lat = random_between(rng, self.lat);
        let lng = random_between(rng, self.lng);
        Point::new(lng, lat)
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.lng.0..=self.lng.1).contains(&p.x()) && (self.lat.0..=self.lat.1).contains(&p.y())
    }
}

fn random_between<R: Rng + ?Sized>(rng: &mut R, (min, max): (f64, f64)) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

pub fn nyc_regions() -> Vec<Region> {
    vec![
        Region::new("bronx", (40.82, 40.9), (-73.93, -73.85)),
        Region::new("queens", (40.73, 40.77), (-73.87, -73.75)),
        Region::new("brooklyn", (40.65, 40.7), (-74.02, -73.85)),
        Region::new("harlem", (40.79, 40.82), (-73.97, -73.93)),
    ]
}

/// Picks a region uniformly, then a point uniformly inside it.
pub fn sample_home<R: Rng + ?Sized>(regions: &[Region], rng: &mut R) -> Option<Point> {
    if regions.is_empty() {
        return None;
    }
    let region = &regions[rng.gen_range(0..regions.len())];
    Some(region.sample(rng))
}
