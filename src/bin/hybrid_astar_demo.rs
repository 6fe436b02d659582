// Hybrid A* warm-start planning demo
//
// Plans a trajectory across an open lot with one rectangular obstacle
// and saves the result plot as a PNG.

use gnuplot::{AxesCommon, Caption, Color, Figure};

use hybrid_astar_planner::common::types::{AreaBounds, Point2D, Pose2D};
use hybrid_astar_planner::path_planning::HybridAStarPlanner;

fn main() {
    println!("Hybrid A* planning start!!");

    let start = Pose2D::new(-4.0, 2.0, 0.0);
    let goal = Pose2D::new(2.0, 0.0, 0.0);
    let bounds = AreaBounds::new(-8.0, 8.0, -4.0, 6.0);
    let obstacle = vec![
        Point2D::new(-1.0, 0.5),
        Point2D::new(0.0, 0.5),
        Point2D::new(0.0, 2.5),
        Point2D::new(-1.0, 2.5),
        Point2D::new(-1.0, 0.5),
    ];
    let obstacles = vec![obstacle];

    let planner = HybridAStarPlanner::with_defaults();
    match planner.plan(start, goal, &bounds, &obstacles) {
        Ok(result) => {
            println!("Trajectory found with {} poses", result.x.len());
            let v_max = result.v.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
            println!("Peak speed: {:.2} m/s", v_max);

            let mut fg = Figure::new();
            let axes = fg.axes2d();
            for polygon in &obstacles {
                let ox: Vec<f64> = polygon.iter().map(|p| p.x).collect();
                let oy: Vec<f64> = polygon.iter().map(|p| p.y).collect();
                axes.lines(&ox, &oy, &[Caption("Obstacle"), Color(gnuplot::RGBString("black"))]);
            }
            axes.lines(&result.x, &result.y, &[Caption("Trajectory"), Color(gnuplot::RGBString("blue"))]);

            let arrow_length = 0.8;
            let start_arrow_x = vec![start.x, start.x + arrow_length * start.phi.cos()];
            let start_arrow_y = vec![start.y, start.y + arrow_length * start.phi.sin()];
            let goal_arrow_x = vec![goal.x, goal.x + arrow_length * goal.phi.cos()];
            let goal_arrow_y = vec![goal.y, goal.y + arrow_length * goal.phi.sin()];
            axes.lines(&start_arrow_x, &start_arrow_y, &[Caption("Start"), Color(gnuplot::RGBString("red"))]);
            axes.lines(&goal_arrow_x, &goal_arrow_y, &[Caption("Goal"), Color(gnuplot::RGBString("green"))]);

            axes.set_title("Hybrid A* Warm-Start Trajectory", &[])
                .set_x_label("X [m]", &[])
                .set_y_label("Y [m]", &[])
                .set_aspect_ratio(gnuplot::AutoOption::Fix(1.0));

            std::fs::create_dir_all("img").unwrap();
            let output_path = "img/hybrid_astar_result.png";
            fg.save_to_png(output_path, 800, 600).unwrap();
            println!("Plot saved to: {}", output_path);
        }
        Err(err) => {
            println!("Planning failed: {}", err);
        }
    }

    println!("Hybrid A* planning finish!!");
}
