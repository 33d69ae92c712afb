mod local;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "simulate" => local::simulate::run(),
            "replay" => {
                let path = args
                    .get(2)
                    .map(String::as_str)
                    .unwrap_or("./data/capture.csv");
                local::replay::run(path).unwrap()
            }
            _ => println!("Invalid argument, please use 'simulate' or 'replay <file>'"),
        }
    } else {
        println!("Please specify 'simulate' or 'replay <file>' as argument");
    }
}
